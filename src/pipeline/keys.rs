//! # Keys
//!
//! Package-list object keys and output row keys.

use crate::constants::{BAKE_KEY_SEPARATOR, PACKAGE_LIST_SUFFIX};

/// Where package lists live in the bucket: `<prefix>/<recipeId>--<bakeId>.txt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageListLayout {
    prefix: String,
}

impl PackageListLayout {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// Full object key of the package list for one bake
    #[must_use]
    pub fn key_for(&self, recipe_id: &str, bake_id: &str) -> String {
        format!(
            "{}{recipe_id}{BAKE_KEY_SEPARATOR}{bake_id}{PACKAGE_LIST_SUFFIX}",
            self.list_prefix()
        )
    }

    /// Prefix to enumerate every package list
    #[must_use]
    pub fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        }
    }

    /// Split a full key back into `(imageId, bakeId)`.
    ///
    /// Returns `None` for keys outside the prefix, the `.` placeholder and
    /// names without a `--` separator. Only the first `--` splits, so bake
    /// ids may themselves contain `--`.
    #[must_use]
    pub fn parse_key(&self, key: &str) -> Option<(String, String)> {
        let relative = key
            .strip_prefix(self.list_prefix().as_str())?
            .trim_start_matches('/');
        if relative.is_empty() || relative == "." || relative.contains('/') {
            return None;
        }
        let stem = relative
            .strip_suffix(PACKAGE_LIST_SUFFIX)
            .unwrap_or(relative);
        let (image_id, bake_id) = stem.split_once(BAKE_KEY_SEPARATOR)?;
        if image_id.is_empty() || bake_id.is_empty() {
            return None;
        }
        Some((image_id.to_string(), bake_id.to_string()))
    }
}

/// Identity of one output row. Later rows with an equal key replace earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub recipe_id: String,
    pub bake_id: String,
    pub ami_id: String,
    pub package_name: String,
}
