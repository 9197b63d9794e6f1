//! Resetting the active-set directory before each run.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::manifest::ManifestReader;
use crate::runtime::Runtime;

/// What a synchronization pass did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Managed links removed.
    pub removed: usize,
    /// Legacy mod directories moved into the store.
    pub migrated: Vec<String>,
    /// Legacy mod directories whose name was already taken in the store.
    pub conflicted: Vec<String>,
}

/// Tears down the previous run's links and adopts mods that were installed
/// directly into the active-set directory.
pub struct LinkSetSynchronizer<'a, R: Runtime> {
    runtime: &'a R,
    active_dir: PathBuf,
    store_dir: PathBuf,
    conflicts_dir: PathBuf,
}

impl<'a, R: Runtime> LinkSetSynchronizer<'a, R> {
    pub fn new(runtime: &'a R, active_dir: PathBuf, store_dir: PathBuf, conflicts_dir: PathBuf) -> Self {
        Self {
            runtime,
            active_dir,
            store_dir,
            conflicts_dir,
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn synchronize(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        if !self.runtime.is_dir(&self.active_dir) {
            debug!("{:?} does not exist, nothing to synchronize", self.active_dir);
            return Ok(report);
        }

        let reader = ManifestReader::new(self.runtime);
        let mut entries = self.runtime.read_dir(&self.active_dir)?;
        entries.sort();

        for entry in entries {
            if self.runtime.is_symlink(&entry) {
                if self
                    .runtime
                    .remove_symlink_if_target_under(&entry, &self.store_dir, "mod link")?
                {
                    report.removed += 1;
                }
                continue;
            }

            if !self.runtime.is_dir(&entry) || reader.find(&entry).is_none() {
                continue;
            }

            let Some(name) = entry.file_name().and_then(|n| n.to_str()).map(str::to_string)
            else {
                continue;
            };

            let destination = self.store_dir.join(&name);
            if self.runtime.exists(&destination) || self.runtime.is_symlink(&destination) {
                let parked = self.conflicts_dir.join(format!("{}-{}", name, unix_time()));
                warn!(
                    "Mod store already has '{}'; moving {:?} to {:?}",
                    name, entry, parked
                );
                self.move_dir(&entry, &parked)?;
                report.conflicted.push(name);
            } else {
                info!("Migrating legacy mod '{}' into the mod store", name);
                self.move_dir(&entry, &destination)?;
                report.migrated.push(name);
            }
        }

        Ok(report)
    }

    /// Rename, falling back to copy and delete when the two paths are on
    /// different filesystems (the active set lives inside the overlay).
    fn move_dir(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            self.runtime.create_dir_all(parent)?;
        }

        if let Err(e) = self.runtime.rename(from, to) {
            debug!("rename {:?} -> {:?} failed ({}), copying instead", from, to, e);
            self.runtime
                .copy_dir_all(from, to)
                .with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
            self.runtime
                .remove_dir_all(from)
                .with_context(|| format!("Failed to remove {:?} after copying", from))?;
        }
        Ok(())
    }
}

fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
