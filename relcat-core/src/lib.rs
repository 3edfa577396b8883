//! Release catalog aggregation
//!
//! Pulls release metadata from an upstream release API, sorts downloadable
//! assets into platform buckets, attaches `sha256:` checksums where they
//! can be found, and maintains a `releases.yml` catalog with one `latest`
//! record and a newest-first `previous` history.

pub mod aggregate;
pub mod checksum;
pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod store;
pub mod upstream;

pub use aggregate::{Aggregator, FetchMode, RunSummary};
pub use classify::{classify, ClassificationTable, PlatformKey};
pub use config::AggregatorConfig;
pub use error::{CatalogError, Result};
pub use model::{Catalog, DownloadEntry, Downloads, VersionRecord};
pub use store::CatalogStore;
pub use upstream::{HttpTransport, ReleaseTransport};
