//! # In-Memory Stores
//!
//! `MetadataStore` and `BlobStore` implementations backed by plain maps.
//!
//! Used for tests and local dry runs. Both can serve results in small
//! pages to exercise pagination draining, and can be told to fail
//! specific calls with a transport error.

use crate::error::StoreError;
use crate::model::{AttributeValue, Item};
use crate::store::pagination::{drain_pages, Page};
use crate::store::{BlobStore, MetadataStore};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Metadata store holding tables in memory
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    tables: HashMap<String, Vec<Item>>,
    page_size: Option<usize>,
    failing_tables: HashSet<String>,
}

impl MemoryMetadataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item to `table`
    #[must_use]
    pub fn with_item(mut self, table: &str, item: Item) -> Self {
        self.tables.entry(table.to_string()).or_default().push(item);
        self
    }

    /// Serve scans `page_size` items at a time
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Make every call against `table` fail with a transport error
    #[must_use]
    pub fn failing(mut self, table: &str) -> Self {
        self.failing_tables.insert(table.to_string());
        self
    }

    fn check(&self, table: &str, operation: &str) -> Result<(), StoreError> {
        if self.failing_tables.contains(table) {
            return Err(StoreError::transport(
                format!("{operation}({table})"),
                "injected failure",
            ));
        }
        Ok(())
    }

    fn page(&self, table: &str, offset: usize) -> Page<Item, usize> {
        let items = self.tables.get(table).map_or(&[][..], Vec::as_slice);
        let size = self.page_size.unwrap_or(items.len().max(1));
        let end = (offset + size).min(items.len());
        Page {
            items: items.get(offset..end).unwrap_or_default().to_vec(),
            next: (end < items.len()).then_some(end),
            truncated: end < items.len(),
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn list_all(&self, table: &str) -> Result<Vec<Item>, StoreError> {
        self.check(table, "memory.scan")?;
        drain_pages("memory.scan", |cursor: Option<usize>| {
            let page = self.page(table, cursor.unwrap_or(0));
            async move { Ok(page) }
        })
        .await
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<Item>, StoreError> {
        self.check(table, "memory.get_item")?;
        Ok(self.tables.get(table).and_then(|items| {
            items
                .iter()
                .find(|item| matches!(item.get("id"), Some(AttributeValue::S(value)) if value == id))
                .cloned()
        }))
    }
}

/// Blob store holding objects in memory, keyed by full key
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: BTreeMap<String, Vec<u8>>,
    page_size: Option<usize>,
    failing_keys: HashSet<String>,
    gets: AtomicUsize,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_object(mut self, key: &str, data: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(key.to_string(), data.into());
        self
    }

    /// Serve listings `page_size` keys at a time
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Make `get` on `key` fail with a transport error
    #[must_use]
    pub fn failing(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    /// Number of `get` calls served so far
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::Relaxed)
    }

    fn page(&self, prefix: &str, after: Option<&str>) -> Page<String, String> {
        let size = self.page_size.unwrap_or(usize::MAX);
        let mut matching = self
            .objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| after.is_none_or(|after| key.as_str() > after));

        let items: Vec<String> = matching.by_ref().take(size).cloned().collect();
        let more = matching.next().is_some();
        Page {
            next: if more { items.last().cloned() } else { None },
            items,
            truncated: more,
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if self.failing_keys.contains(key) {
            return Err(StoreError::transport("memory.get_object", "injected failure"));
        }
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        drain_pages("memory.list_objects", |cursor: Option<String>| {
            let page = self.page(prefix, cursor.as_deref());
            async move { Ok(page) }
        })
        .await
    }
}
