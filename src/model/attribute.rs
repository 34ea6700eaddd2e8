//! # Attribute Values
//!
//! Store-neutral representation of metadata items.
//!
//! Items come back from the metadata store untyped. Every field a caller
//! needs is pulled out through one of the extraction functions below,
//! which report a [`FieldError`] instead of assuming a type.

use crate::error::FieldError;
use std::collections::HashMap;

/// One item from the metadata store, keyed by attribute name
pub type Item = HashMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String
    S(String),
    /// Number, kept in its wire text form
    N(String),
    Bool(bool),
    /// String set
    Ss(Vec<String>),
    /// Number set
    Ns(Vec<String>),
    L(Vec<AttributeValue>),
    M(Item),
    Null,
    /// A kind this crate never reads (binary, binary set, ...)
    Other(&'static str),
}

impl AttributeValue {
    /// Human-readable kind, used in type mismatch errors
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "string",
            AttributeValue::N(_) => "number",
            AttributeValue::Bool(_) => "boolean",
            AttributeValue::Ss(_) => "string set",
            AttributeValue::Ns(_) => "number set",
            AttributeValue::L(_) => "list",
            AttributeValue::M(_) => "map",
            AttributeValue::Null => "null",
            AttributeValue::Other(kind) => kind,
        }
    }

    /// Plain JSON rendering, used when printing raw items
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            AttributeValue::S(s) => Value::String(s.clone()),
            AttributeValue::N(n) => number_to_json(n),
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Ss(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            AttributeValue::Ns(items) => Value::Array(items.iter().map(|n| number_to_json(n)).collect()),
            AttributeValue::L(items) => Value::Array(items.iter().map(AttributeValue::to_json).collect()),
            AttributeValue::M(item) => item_to_json(item),
            AttributeValue::Null => Value::Null,
            AttributeValue::Other(kind) => Value::String(format!("<{kind}>")),
        }
    }
}

fn number_to_json(text: &str) -> serde_json::Value {
    serde_json::from_str::<serde_json::Number>(text)
        .map_or_else(|_| serde_json::Value::String(text.to_string()), serde_json::Value::Number)
}

/// Render a whole item as a JSON object with sorted keys
#[must_use]
pub fn item_to_json(item: &Item) -> serde_json::Value {
    let mut keys: Vec<&String> = item.keys().collect();
    keys.sort();
    let map = keys
        .into_iter()
        .map(|key| (key.clone(), item[key].to_json()))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

/// Required string attribute
pub fn string<'a>(item: &'a Item, field: &'static str) -> Result<&'a str, FieldError> {
    optional_string(item, field)?.ok_or(FieldError::Missing { field })
}

/// Optional string attribute. Absent and explicit null both yield `None`.
pub fn optional_string<'a>(
    item: &'a Item,
    field: &'static str,
) -> Result<Option<&'a str>, FieldError> {
    match item.get(field) {
        None | Some(AttributeValue::Null) => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.as_str())),
        Some(other) => Err(FieldError::WrongType {
            field,
            expected: "string",
            found: other.kind(),
        }),
    }
}

/// Required non-negative integer attribute
pub fn unsigned(item: &Item, field: &'static str) -> Result<u64, FieldError> {
    match item.get(field) {
        None | Some(AttributeValue::Null) => Err(FieldError::Missing { field }),
        Some(AttributeValue::N(text)) => {
            text.trim()
                .parse::<u64>()
                .map_err(|_| FieldError::InvalidNumber {
                    field,
                    value: text.clone(),
                })
        }
        Some(other) => Err(FieldError::WrongType {
            field,
            expected: "number",
            found: other.kind(),
        }),
    }
}

/// Optional list of strings, stored either as a string set or as a list of strings.
/// Absent or null yields an empty list.
pub fn string_list(item: &Item, field: &'static str) -> Result<Vec<String>, FieldError> {
    match item.get(field) {
        None | Some(AttributeValue::Null) => Ok(Vec::new()),
        Some(AttributeValue::Ss(values)) => Ok(values.clone()),
        Some(AttributeValue::L(values)) => values
            .iter()
            .map(|value| match value {
                AttributeValue::S(s) => Ok(s.clone()),
                other => Err(FieldError::WrongType {
                    field,
                    expected: "list of strings",
                    found: other.kind(),
                }),
            })
            .collect(),
        Some(other) => Err(FieldError::WrongType {
            field,
            expected: "list of strings",
            found: other.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_string_reports_missing_and_wrong_type() {
        let it = item(&[("count", AttributeValue::N("3".to_string()))]);
        assert_eq!(string(&it, "id"), Err(FieldError::Missing { field: "id" }));
        assert_eq!(
            string(&it, "count"),
            Err(FieldError::WrongType {
                field: "count",
                expected: "string",
                found: "number"
            })
        );
    }

    #[test]
    fn test_optional_string_treats_null_as_absent() {
        let it = item(&[("amiId", AttributeValue::Null)]);
        assert_eq!(optional_string(&it, "amiId"), Ok(None));
    }

    #[test]
    fn test_unsigned_parses_number_text() {
        let it = item(&[
            ("good", AttributeValue::N("42".to_string())),
            ("bad", AttributeValue::N("4.2".to_string())),
            ("text", AttributeValue::S("42".to_string())),
        ]);
        assert_eq!(unsigned(&it, "good"), Ok(42));
        assert_eq!(
            unsigned(&it, "bad"),
            Err(FieldError::InvalidNumber {
                field: "bad",
                value: "4.2".to_string()
            })
        );
        assert!(matches!(
            unsigned(&it, "text"),
            Err(FieldError::WrongType { .. })
        ));
    }

    #[test]
    fn test_string_list_accepts_sets_and_lists() {
        let it = item(&[
            (
                "set",
                AttributeValue::Ss(vec!["111".to_string(), "222".to_string()]),
            ),
            (
                "list",
                AttributeValue::L(vec![AttributeValue::S("333".to_string())]),
            ),
            (
                "mixed",
                AttributeValue::L(vec![AttributeValue::N("1".to_string())]),
            ),
        ]);
        assert_eq!(string_list(&it, "set").unwrap(), vec!["111", "222"]);
        assert_eq!(string_list(&it, "list").unwrap(), vec!["333"]);
        assert!(string_list(&it, "absent").unwrap().is_empty());
        assert!(string_list(&it, "mixed").is_err());
    }

    #[test]
    fn test_item_to_json() {
        let it = item(&[
            ("id", AttributeValue::S("r1".to_string())),
            ("size", AttributeValue::N("10".to_string())),
            ("weird", AttributeValue::N("NaNish".to_string())),
        ]);
        let json = item_to_json(&it);
        assert_eq!(json["id"], "r1");
        assert_eq!(json["size"], 10);
        assert_eq!(json["weird"], "NaNish");
    }
}
