//! Asset classification by target platform
//!
//! Maps an upstream file name to a platform bucket using fixed,
//! case-insensitive suffix tables. Tables are immutable once built and are
//! shared by reference.
//!
//! Buckets are tried in `mac, win, linux` order and the first match wins.
//! The standard tables are disjoint, but callers extending them rely on
//! this order, so it is part of the contract.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform bucket in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKey {
    Mac,
    Win,
    Linux,
}

impl PlatformKey {
    /// Bucket iteration order
    pub const ALL: [PlatformKey; 3] = [PlatformKey::Mac, PlatformKey::Win, PlatformKey::Linux];

    /// Catalog key (`mac`, `win`, `linux`)
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKey::Mac => "mac",
            PlatformKey::Win => "win",
            PlatformKey::Linux => "linux",
        }
    }

    /// Display name used in download labels
    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformKey::Mac => "macOS",
            PlatformKey::Win => "Windows (x64)",
            PlatformKey::Linux => "Linux",
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suffix patterns for one platform
#[derive(Debug)]
struct PlatformRule {
    key: PlatformKey,
    pattern: Regex,
}

/// Immutable classification tables
#[derive(Debug)]
pub struct ClassificationTable {
    rules: Vec<PlatformRule>,
}

static STANDARD: Lazy<ClassificationTable> = Lazy::new(ClassificationTable::default);

impl ClassificationTable {
    /// The standard `mac / win / linux` tables
    pub fn standard() -> &'static ClassificationTable {
        &STANDARD
    }

    /// Build tables from per-platform extension lists.
    ///
    /// Extensions are given without the leading dot and are matched
    /// literally and case-insensitively against the end of the file name.
    /// Rules are tried in the order given.
    pub fn from_extensions(table: &[(PlatformKey, &[&str])]) -> Self {
        let rules = table
            .iter()
            .map(|(key, extensions)| {
                let alternation = extensions
                    .iter()
                    .map(|ext| regex::escape(ext))
                    .collect::<Vec<_>>()
                    .join("|");
                let pattern = Regex::new(&format!(r"(?i)\.(?:{alternation})$"))
                    .expect("escaped extension alternation is a valid regex");
                PlatformRule { key: *key, pattern }
            })
            .collect();

        Self { rules }
    }

    /// Classify a file name, first matching rule wins
    pub fn classify(&self, file_name: &str) -> Option<PlatformKey> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(file_name))
            .map(|rule| rule.key)
    }

    /// Label shown next to a download link
    pub fn label(key: PlatformKey, file_name: &str) -> String {
        format!("{} — {}", key.display_name(), file_name)
    }
}

impl Default for ClassificationTable {
    fn default() -> Self {
        Self::from_extensions(&[
            (PlatformKey::Mac, &["dmg", "pkg", "tar.gz"]),
            (PlatformKey::Win, &["exe", "msi"]),
            (PlatformKey::Linux, &["AppImage", "deb", "rpm"]),
        ])
    }
}

/// Classify against the standard tables
pub fn classify(file_name: &str) -> Option<PlatformKey> {
    ClassificationTable::standard().classify(file_name)
}
