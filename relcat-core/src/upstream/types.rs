//! Raw upstream release records (GitHub releases API shape)
//!
//! Every field is optional on the wire. Absent and `null` values both
//! deserialize to the type's default so that normalization never has to
//! special-case missing data.

use serde::{Deserialize, Deserializer, Serialize};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One release record as returned by the upstream API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRelease {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub draft: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub prerelease: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub published_at: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,

    /// Release details page
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: Vec<RawAsset>,
}

/// A downloadable file attached to a release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAsset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub browser_download_url: String,
}

impl RawAsset {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            browser_download_url: url.into(),
        }
    }
}

/// One page of the release list plus its continuation pointer
#[derive(Debug, Clone, Default)]
pub struct ReleasePage {
    pub releases: Vec<RawRelease>,

    /// `rel="next"` URL, if upstream has more pages
    pub next: Option<String>,
}
