//! The persisted, last-installed framework version.

use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// A single version token stored in a plain text file.
pub struct VersionStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> VersionStore<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The installed version, or `None` if nothing was installed yet.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Result<Option<String>> {
        if !self.runtime.exists(&self.path) {
            debug!("No installed version recorded at {:?}", self.path);
            return Ok(None);
        }

        let text = self
            .runtime
            .read_to_string(&self.path)
            .with_context(|| format!("Failed to read installed version from {:?}", self.path))?;
        let version = text.trim();
        Ok((!version.is_empty()).then(|| version.to_string()))
    }

    /// Replace the stored version. Written to a sibling file first and
    /// renamed over the old one, so a crash never leaves a partial token.
    #[tracing::instrument(skip(self))]
    pub fn save(&self, version: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            self.runtime.create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        self.runtime
            .write(&tmp, format!("{}\n", version).as_bytes())
            .with_context(|| format!("Failed to write {:?}", tmp))?;
        self.runtime
            .rename(&tmp, &self.path)
            .with_context(|| format!("Failed to record installed version in {:?}", self.path))?;
        Ok(())
    }
}

/// Whether `remote` should replace `installed`.
///
/// Tokens are compared as plain strings, so `1.10.0` sorts before `1.9.0`.
/// Nothing installed is always older.
pub fn is_newer(remote: &str, installed: Option<&str>) -> bool {
    match installed {
        Some(installed) => remote > installed,
        None => true,
    }
}
