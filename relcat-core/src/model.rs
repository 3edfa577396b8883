//! Catalog data model
//!
//! These types are the field contract read by the docs site renderer:
//! `latest.{version,date,notes_url,downloads,draft}` and `previous: [..]`.
//! Field order in the structs is the order written to disk, so do not
//! reorder fields without expecting a noisy diff in the published catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::checksum::is_valid_checksum;
use crate::classify::PlatformKey;

/// A single downloadable artifact as shown on the docs site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadEntry {
    /// Human label, e.g. `macOS — App-1.2.0.dmg`
    #[serde(default)]
    pub label: String,

    /// Direct download URL
    #[serde(default)]
    pub url: String,

    /// Empty, or `sha256:<64 lowercase hex>`
    #[serde(default)]
    pub checksum: String,
}

/// Downloads partitioned by platform, each in upstream asset order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Downloads {
    #[serde(default)]
    pub mac: Vec<DownloadEntry>,
    #[serde(default)]
    pub win: Vec<DownloadEntry>,
    #[serde(default)]
    pub linux: Vec<DownloadEntry>,
}

impl Downloads {
    pub fn bucket(&self, key: PlatformKey) -> &[DownloadEntry] {
        match key {
            PlatformKey::Mac => &self.mac,
            PlatformKey::Win => &self.win,
            PlatformKey::Linux => &self.linux,
        }
    }

    pub fn bucket_mut(&mut self, key: PlatformKey) -> &mut Vec<DownloadEntry> {
        match key {
            PlatformKey::Mac => &mut self.mac,
            PlatformKey::Win => &mut self.win,
            PlatformKey::Linux => &mut self.linux,
        }
    }

    /// Iterate all entries in `mac, win, linux` order
    pub fn iter(&self) -> impl Iterator<Item = (PlatformKey, &DownloadEntry)> {
        PlatformKey::ALL
            .into_iter()
            .flat_map(move |key| self.bucket(key).iter().map(move |e| (key, e)))
    }

    pub fn len(&self) -> usize {
        self.mac.len() + self.win.len() + self.linux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One release as it appears in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Upstream tag, the catalog identity key
    #[serde(default)]
    pub version: String,

    /// `YYYY-MM-DD`, or empty when upstream carried no timestamp
    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub notes_url: String,

    #[serde(default)]
    pub downloads: Downloads,

    #[serde(default)]
    pub draft: bool,
}

impl VersionRecord {
    /// Sort key for `previous`: compared descending
    pub fn order_key(&self) -> (&str, &str) {
        (self.date.as_str(), self.version.as_str())
    }

    /// Number of downloads carrying a checksum
    pub fn checksummed_count(&self) -> usize {
        self.downloads
            .iter()
            .filter(|(_, e)| !e.checksum.is_empty())
            .count()
    }
}

/// Sort records most recent first by `(date, version)`
pub fn sort_newest_first(records: &mut [VersionRecord]) {
    records.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
}

/// The persisted release catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub latest: Option<VersionRecord>,

    #[serde(default)]
    pub previous: Vec<VersionRecord>,
}

impl Catalog {
    /// Parse a catalog from YAML
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        // An empty file is an empty catalog
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content).context("Failed to parse release catalog YAML")
    }

    /// Serialize to YAML in declaration field order
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        use anyhow::Context;
        serde_yaml_ng::to_string(self).context("Failed to serialize release catalog")
    }

    /// Total number of releases (latest + previous)
    pub fn release_count(&self) -> usize {
        self.previous.len() + usize::from(self.latest.is_some())
    }

    /// All records, latest first
    pub fn records(&self) -> impl Iterator<Item = &VersionRecord> {
        self.latest.iter().chain(self.previous.iter())
    }

    /// Look up a release by version
    pub fn get(&self, version: &str) -> Option<&VersionRecord> {
        self.records().find(|r| r.version == version)
    }

    /// Check every catalog invariant and report all violations
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for record in self.records() {
            if record.version.is_empty() {
                problems.push("release with empty version".to_string());
                continue;
            }
            if !seen.insert(record.version.as_str()) {
                problems.push(format!("duplicate version '{}'", record.version));
            }
            for (_, entry) in record.downloads.iter() {
                if !is_valid_checksum(&entry.checksum) {
                    problems.push(format!(
                        "malformed checksum '{}' on {} ({})",
                        entry.checksum, record.version, entry.label
                    ));
                }
            }
        }

        if let Some(latest) = &self.latest {
            if self.previous.iter().any(|p| p.version == latest.version) {
                problems.push(format!(
                    "latest version '{}' also listed in previous",
                    latest.version
                ));
            }
        }

        for pair in self.previous.windows(2) {
            if pair[0].order_key() < pair[1].order_key() {
                problems.push(format!(
                    "previous not sorted newest first: '{}' before '{}'",
                    pair[0].version, pair[1].version
                ));
            }
        }

        problems
    }
}
