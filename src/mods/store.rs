use anyhow::Result;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::manifest::{ManifestReader, ModManifest};
use crate::runtime::Runtime;

/// One mod directory in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub name: String,
    pub dir: PathBuf,
    pub manifest: Option<ModManifest>,
}

impl StoreEntry {
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.manifest
            .as_ref()
            .map(|m| m.dependencies.clone())
            .unwrap_or_default()
    }
}

/// The persistent, user-populated directory of mods.
///
/// Mods are keyed by the `Name` in their manifest, falling back to the
/// directory name when there is none. The store is scanned afresh on every
/// call; nothing is cached.
pub struct ModStore<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
}

impl<'a, R: Runtime> ModStore<'a, R> {
    pub fn new(runtime: &'a R, root: PathBuf) -> Self {
        Self { runtime, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[tracing::instrument(skip(self))]
    pub fn entries(&self) -> Result<BTreeMap<String, StoreEntry>> {
        let mut entries = BTreeMap::new();

        if !self.runtime.exists(&self.root) {
            debug!("Mod store {:?} does not exist yet", self.root);
            return Ok(entries);
        }

        let reader = ManifestReader::new(self.runtime);
        let mut dirs = self.runtime.read_dir(&self.root)?;
        dirs.sort();

        for dir in dirs {
            let Some(dir_name) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if dir_name.starts_with('.') || !self.runtime.is_dir(&dir) {
                continue;
            }

            let manifest = reader.read(&dir);
            let name = manifest
                .as_ref()
                .and_then(|m| m.name.clone())
                .unwrap_or_else(|| dir_name.to_string());

            if let Some(existing) = entries.get(&name) {
                warn!(
                    "Mod '{}' is provided by both {:?} and {:?}; using the former",
                    name, existing.dir, dir
                );
                continue;
            }

            entries.insert(
                name.clone(),
                StoreEntry {
                    name,
                    dir,
                    manifest,
                },
            );
        }

        Ok(entries)
    }
}
