//! # Result Builder
//!
//! Accumulates rows for one run, keeping at most one row per key.
//!
//! Rows are merged in the order they are offered: bakes in processing
//! order, and within a bake, package lines in file order. A later row
//! with the same key replaces the earlier one.

use std::collections::BTreeMap;

#[derive(Debug)]
pub struct ResultBuilder<K, V> {
    rows: BTreeMap<K, V>,
    overwritten: usize,
}

impl<K: Ord, V> Default for ResultBuilder<K, V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            overwritten: 0,
        }
    }
}

impl<K: Ord, V> ResultBuilder<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, replacing any earlier row with the same key
    pub fn insert(&mut self, key: K, row: V) {
        if self.rows.insert(key, row).is_some() {
            self.overwritten += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows replaced by a later duplicate so far
    #[must_use]
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }

    /// All rows, ordered by key
    #[must_use]
    pub fn finish(self) -> Vec<V> {
        self.rows.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut builder = ResultBuilder::new();
        builder.insert(("r1", "curl"), "7.0");
        builder.insert(("r1", "zlib"), "1.2");
        builder.insert(("r1", "curl"), "7.1");

        assert_eq!(builder.len(), 2);
        assert_eq!(builder.overwritten(), 1);
        assert_eq!(builder.finish(), vec!["7.1", "1.2"]);
    }

    #[test]
    fn test_empty() {
        let builder: ResultBuilder<String, u8> = ResultBuilder::new();
        assert!(builder.is_empty());
        assert!(builder.finish().is_empty());
    }
}
