//! Upstream release source
//!
//! ```text
//! releases API (GitHub REST)
//!     │
//!     ├── GET /repos/{owner}/{repo}/releases?per_page=N   ← Link: rel="next"
//!     ├── GET /repos/{owner}/{repo}/releases/latest       ← latest-only mode
//!     └── GET <asset download URL>                        ← checksum files, digests
//! ```

mod http;
mod link;
mod paginate;
mod transport;
mod types;

pub use http::HttpTransport;
pub use link::{next_link, parse_link_header, LinkValue};
pub use paginate::{fetch_all_releases, latest_release_url, releases_url, MAX_PAGE_SIZE};
pub use transport::ReleaseTransport;
pub use types::{RawAsset, RawRelease, ReleasePage};
