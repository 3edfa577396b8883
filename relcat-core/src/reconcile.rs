//! Selection and reconciliation of catalog releases
//!
//! # Selection policy: draft priority
//!
//! If any draft exists, the draft with the newest `updated_at` (falling back
//! to `created_at`) becomes `latest`. Otherwise the release with the newest
//! `published_at` (falling back to `created_at`) does. Timestamps are
//! compared as ISO-8601 strings. On equal timestamps the record listed
//! first upstream wins. Prerelease flags play no part in selection.
//!
//! Selection sees every tagged upstream record, duplicates included. When
//! the winning tag occurs more than once among records of the same draft
//! status, its last occurrence is the one used. Duplicates are collapsed
//! only afterwards, among the records that did not become `latest`.
//!
//! # Identity and ordering
//!
//! `version` is the identity key. Duplicates resolve last-write-wins in
//! upstream order, the `latest` version never appears in `previous`, and
//! `previous` is ordered newest first by `(date, version)`.

use std::collections::HashMap;

use crate::model::{sort_newest_first, Catalog, VersionRecord};
use crate::upstream::RawRelease;

fn first_non_empty<'r>(candidates: &[&'r str]) -> &'r str {
    candidates
        .iter()
        .copied()
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

/// Timestamp used to rank a record under the draft-priority policy
fn selection_timestamp(release: &RawRelease) -> &str {
    if release.draft {
        first_non_empty(&[release.updated_at.as_str(), release.created_at.as_str()])
    } else {
        first_non_empty(&[release.published_at.as_str(), release.created_at.as_str()])
    }
}

/// Index of the release that becomes `latest`, or `None` for an empty list
pub fn select_latest(releases: &[RawRelease]) -> Option<usize> {
    let any_draft = releases.iter().any(|r| r.draft);

    releases
        .iter()
        .enumerate()
        .filter(|(_, r)| r.draft == any_draft)
        .fold(None::<(usize, &str)>, |best, (idx, release)| {
            let ts = selection_timestamp(release);
            match best {
                Some((_, best_ts)) if ts <= best_ts => best,
                _ => Some((idx, ts)),
            }
        })
        .map(|(idx, _)| {
            let chosen = &releases[idx];
            releases
                .iter()
                .rposition(|r| r.draft == chosen.draft && r.tag_name == chosen.tag_name)
                .unwrap_or(idx)
        })
}

/// Ordered mapping of releases keyed by `version`
///
/// Inserting a version already present replaces the stored record in place
/// (last write wins) without changing its position.
#[derive(Debug, Clone, Default)]
pub struct VersionMap {
    records: Vec<VersionRecord>,
    positions: HashMap<String, usize>,
}

impl VersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the replaced record
    pub fn insert(&mut self, record: VersionRecord) -> Option<VersionRecord> {
        match self.positions.get(&record.version) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.positions.insert(record.version.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn remove(&mut self, version: &str) -> Option<VersionRecord> {
        let pos = self.positions.remove(version)?;
        let removed = self.records.remove(pos);
        for idx in self.positions.values_mut() {
            if *idx > pos {
                *idx -= 1;
            }
        }
        Some(removed)
    }

    pub fn contains(&self, version: &str) -> bool {
        self.positions.contains_key(version)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in `(date, version)` descending order
    pub fn into_sorted(self) -> Vec<VersionRecord> {
        let mut records = self.records;
        sort_newest_first(&mut records);
        records
    }
}

impl FromIterator<VersionRecord> for VersionMap {
    fn from_iter<I: IntoIterator<Item = VersionRecord>>(iter: I) -> Self {
        let mut map = VersionMap::new();
        for record in iter {
            map.insert(record);
        }
        map
    }
}

/// Drop records without a tag, keeping upstream order
pub fn drop_untagged(releases: Vec<RawRelease>) -> Vec<RawRelease> {
    releases
        .into_iter()
        .filter(|release| !release.tag_name.is_empty())
        .collect()
}

/// Build a catalog from the selected latest and every other record
pub fn assemble(
    latest: VersionRecord,
    others: impl IntoIterator<Item = VersionRecord>,
) -> Catalog {
    let mut previous: VersionMap = others
        .into_iter()
        .filter(|r| !r.version.is_empty())
        .collect();
    previous.remove(&latest.version);

    Catalog {
        latest: Some(latest),
        previous: previous.into_sorted(),
    }
}

/// Merge a freshly fetched latest into a persisted catalog.
///
/// The persisted `latest`, when its version differs, is demoted into
/// `previous` (replacing an entry of the same version). Any `previous`
/// entry carrying the new version is removed, duplicate versions collapse
/// last-write-wins and `previous` is re-sorted. Apart from entries without
/// a version, nothing else is dropped.
pub fn promote(persisted: Catalog, new_latest: VersionRecord) -> Catalog {
    let mut previous: VersionMap = persisted
        .previous
        .into_iter()
        .filter(|r| !r.version.is_empty())
        .collect();

    if let Some(old_latest) = persisted.latest {
        if old_latest.version != new_latest.version && !old_latest.version.is_empty() {
            previous.insert(old_latest);
        }
    }
    previous.remove(&new_latest.version);

    Catalog {
        latest: Some(new_latest),
        previous: previous.into_sorted(),
    }
}
