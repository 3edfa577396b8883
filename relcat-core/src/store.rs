//! Persisted catalog file (`releases.yml`)
//!
//! The catalog is read once at the start of a run and replaced in full at
//! the end. Writes go to a temporary file next to the target and are
//! renamed over it, so readers see either the old or the new catalog.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::model::Catalog;

/// Reads and atomically replaces the catalog file
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted catalog.
    ///
    /// Returns `Ok(None)` when no catalog exists yet and an error when the
    /// file cannot be read or parsed. Invariant violations are logged but
    /// not rejected: a merge repairs them.
    pub fn load(&self) -> Result<Option<Catalog>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| self.read_error(e))?;
        let catalog =
            Catalog::from_yaml(&content).map_err(|e| self.read_error(format!("{e:#}")))?;

        let problems = catalog.check();
        if !problems.is_empty() {
            warn!(
                "{} has {} consistency problem(s): {}",
                self.path.display(),
                problems.len(),
                problems.join("; ")
            );
        }

        debug!(
            "Loaded {} releases from {}",
            catalog.release_count(),
            self.path.display()
        );
        Ok(Some(catalog))
    }

    /// Load the persisted catalog, rejecting any invariant violation
    pub fn load_checked(&self) -> Result<Option<Catalog>> {
        let Some(catalog) = self.load()? else {
            return Ok(None);
        };

        let problems = catalog.check();
        if !problems.is_empty() {
            return Err(self.read_error(problems.join("; ")));
        }
        Ok(Some(catalog))
    }

    /// Replace the catalog file with `catalog`
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let content = catalog
            .to_yaml()
            .map_err(|e| self.persist_error(std::io::Error::other(format!("{e:#}"))))?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| self.persist_error(e))?;

        let mut temp =
            tempfile::NamedTempFile::new_in(&parent).map_err(|e| self.persist_error(e))?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| self.persist_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.persist_error(e.error))?;

        debug!("Wrote {} bytes to {}", content.len(), self.path.display());
        Ok(())
    }

    fn read_error(&self, reason: impl ToString) -> CatalogError {
        CatalogError::CatalogRead {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn persist_error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::Persist {
            path: self.path.clone(),
            source,
        }
    }
}
