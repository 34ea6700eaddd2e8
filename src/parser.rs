//! # Package List Parser
//!
//! Parses the package lists written at the end of every bake.
//!
//! ## Format
//!
//! One package per line, name and version separated by a run of
//! whitespace:
//!
//! ```text
//! curl 7.68.0-1
//! openssl 1.1.1f-1ubuntu2
//! ```
//!
//! The line is split on the first run of ASCII whitespace only, so anything
//! after the name is the version. A non-blank line without a version, or
//! one that is not valid UTF-8, is skipped with a warning; it never aborts
//! the rest of the file.

use crate::model::PackageEntry;
use tracing::{debug, warn};

/// Entries parsed from one package list, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPackageList {
    pub entries: Vec<PackageEntry>,
    /// Number of non-blank lines that were skipped as malformed
    pub skipped_lines: usize,
}

/// Parse raw package list bytes. `source` only labels log messages.
#[must_use]
pub fn parse_package_list(data: &[u8], source: &str) -> ParsedPackageList {
    let mut parsed = ParsedPackageList::default();

    for (index, raw_line) in data.split(|&b| b == b'\n').enumerate() {
        let line_number = index + 1;
        let Ok(text) = std::str::from_utf8(raw_line) else {
            warn!(
                source,
                line = line_number,
                "Skipping package line that is not valid UTF-8"
            );
            parsed.skipped_lines += 1;
            continue;
        };
        let line = text.trim_matches(|c: char| c.is_ascii_whitespace());
        if line.is_empty() {
            continue;
        }

        match split_line(line) {
            Some(entry) => parsed.entries.push(entry),
            None => {
                warn!(
                    source,
                    line = line_number,
                    content = line,
                    "Skipping malformed package line"
                );
                parsed.skipped_lines += 1;
            }
        }
    }

    debug!(
        source,
        packages = parsed.entries.len(),
        skipped = parsed.skipped_lines,
        "Parsed package list"
    );
    parsed
}

/// Split a trimmed line into name and version on the first ASCII whitespace run
fn split_line(line: &str) -> Option<PackageEntry> {
    let split_at = line.find(|c: char| c.is_ascii_whitespace())?;
    let (name, rest) = line.split_at(split_at);
    let version = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if version.is_empty() {
        return None;
    }
    Some(PackageEntry {
        name: name.to_string(),
        version: version.to_string(),
    })
}
