//! # DynamoDB Metadata Store
//!
//! Reads the AMIgo bakes, recipes and base-images tables.
//!
//! `list_all` scans the table page by page, following `LastEvaluatedKey`
//! until DynamoDB stops returning one, so a table larger than the 1 MB
//! scan page is never silently cut short.

use crate::error::StoreError;
use crate::model::{AttributeValue, Item};
use crate::store::pagination::{drain_pages, Page};
use crate::store::MetadataStore;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::AttributeValue as SdkAttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use tracing::{debug, debug_span, Instrument};

type SdkItem = HashMap<String, SdkAttributeValue>;

/// DynamoDB metadata store implementation
pub struct DynamoDbStore {
    client: DynamoDbClient,
}

impl std::fmt::Debug for DynamoDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbStore").finish_non_exhaustive()
    }
}

impl DynamoDbStore {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: DynamoDbClient::new(sdk_config),
        }
    }

    #[must_use]
    pub fn from_client(client: DynamoDbClient) -> Self {
        Self { client }
    }

    async fn scan_page(
        &self,
        table: &str,
        start_key: Option<SdkItem>,
    ) -> Result<Page<Item, SdkItem>, StoreError> {
        let output = self
            .client
            .scan()
            .table_name(table)
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|e| StoreError::transport(format!("dynamodb.scan({table})"), e))?;

        let items: Vec<Item> = output.items().iter().map(convert_item).collect();
        let next = output
            .last_evaluated_key()
            .filter(|key| !key.is_empty())
            .cloned();
        debug!(table, items = items.len(), more = next.is_some(), "Scanned page");

        Ok(Page {
            items,
            next,
            truncated: false,
        })
    }
}

#[async_trait]
impl MetadataStore for DynamoDbStore {
    async fn list_all(&self, table: &str) -> Result<Vec<Item>, StoreError> {
        let span = debug_span!("dynamodb.scan", table = table);
        let operation = format!("dynamodb.scan({table})");
        drain_pages(&operation, |cursor| self.scan_page(table, cursor))
            .instrument(span)
            .await
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let span = debug_span!("dynamodb.get_item", table = table, id = id);
        async move {
            let output = self
                .client
                .get_item()
                .table_name(table)
                .key("id", SdkAttributeValue::S(id.to_string()))
                .send()
                .await
                .map_err(|e| StoreError::transport(format!("dynamodb.get_item({table})"), e))?;

            Ok(output.item().map(convert_item))
        }
        .instrument(span)
        .await
    }
}

fn convert_item(item: &SdkItem) -> Item {
    item.iter()
        .map(|(name, value)| (name.clone(), convert_value(value)))
        .collect()
}

fn convert_value(value: &SdkAttributeValue) -> AttributeValue {
    match value {
        SdkAttributeValue::S(s) => AttributeValue::S(s.clone()),
        SdkAttributeValue::N(n) => AttributeValue::N(n.clone()),
        SdkAttributeValue::Bool(b) => AttributeValue::Bool(*b),
        SdkAttributeValue::Ss(values) => AttributeValue::Ss(values.clone()),
        SdkAttributeValue::Ns(values) => AttributeValue::Ns(values.clone()),
        SdkAttributeValue::L(values) => AttributeValue::L(values.iter().map(convert_value).collect()),
        SdkAttributeValue::M(map) => AttributeValue::M(convert_item(map)),
        SdkAttributeValue::Null(_) => AttributeValue::Null,
        SdkAttributeValue::B(_) => AttributeValue::Other("binary"),
        SdkAttributeValue::Bs(_) => AttributeValue::Other("binary set"),
        _ => AttributeValue::Other("unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_nested_values() {
        let sdk: SdkItem = [
            ("id".to_string(), SdkAttributeValue::S("r1".to_string())),
            (
                "encryptFor".to_string(),
                SdkAttributeValue::L(vec![SdkAttributeValue::S("123456789012".to_string())]),
            ),
            ("buildNumber".to_string(), SdkAttributeValue::N("7".to_string())),
            ("amiId".to_string(), SdkAttributeValue::Null(true)),
        ]
        .into_iter()
        .collect();

        let item = convert_item(&sdk);
        assert_eq!(item["id"], AttributeValue::S("r1".to_string()));
        assert_eq!(
            item["encryptFor"],
            AttributeValue::L(vec![AttributeValue::S("123456789012".to_string())])
        );
        assert_eq!(item["buildNumber"], AttributeValue::N("7".to_string()));
        assert_eq!(item["amiId"], AttributeValue::Null);
    }

    #[test]
    fn test_binary_values_are_tagged_not_dropped() {
        let value = SdkAttributeValue::B(aws_sdk_dynamodb::primitives::Blob::new(vec![1, 2]));
        assert_eq!(convert_value(&value), AttributeValue::Other("binary"));
    }
}
