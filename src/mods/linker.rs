//! Computing and materializing the set of mods active for one run.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::store::{ModStore, StoreEntry};
use crate::error::EverlayError;
use crate::runtime::Runtime;

/// Dependencies provided by the game and the framework themselves.
pub const RUNTIME_PROVIDED: [&str; 2] = ["Everest", "Celeste"];

/// What the caller asked to make active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModRequest {
    All,
    Named(String),
}

impl From<Option<String>> for ModRequest {
    fn from(name: Option<String>) -> Self {
        match name {
            Some(name) => ModRequest::Named(name),
            None => ModRequest::All,
        }
    }
}

/// Mod name → store directory for every mod visible to this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveLinkSet {
    entries: BTreeMap<String, PathBuf>,
}

impl ActiveLinkSet {
    fn insert(&mut self, name: String, dir: PathBuf) {
        self.entries.insert(name, dir);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, dir)| (name.as_str(), dir.as_path()))
    }
}

/// Resolves a request to its dependency closure and links it into the
/// active-set directory.
pub struct DependencyLinker<'a, R: Runtime> {
    runtime: &'a R,
    store: ModStore<'a, R>,
    active_dir: PathBuf,
}

impl<'a, R: Runtime> DependencyLinker<'a, R> {
    pub fn new(runtime: &'a R, store_dir: PathBuf, active_dir: PathBuf) -> Self {
        Self {
            runtime,
            store: ModStore::new(runtime, store_dir),
            active_dir,
        }
    }

    /// Resolve and materialize. Nothing is written if the request fails.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, request: &ModRequest) -> Result<ActiveLinkSet> {
        let active = self.plan(request)?;
        self.materialize(&active)?;
        info!("Activated {} mod(s)", active.len());
        Ok(active)
    }

    /// Compute the closure without touching the filesystem.
    #[tracing::instrument(skip(self))]
    pub fn plan(&self, request: &ModRequest) -> Result<ActiveLinkSet> {
        let entries = self.store.entries()?;
        close_over(&entries, request)
    }

    fn materialize(&self, active: &ActiveLinkSet) -> Result<()> {
        self.runtime
            .create_dir_all(&self.active_dir)
            .with_context(|| format!("Failed to create {:?}", self.active_dir))?;

        for (name, dir) in active.iter() {
            let link_name = dir.file_name().unwrap_or_else(|| OsStr::new(name));
            let link = self.active_dir.join(link_name);

            if self.runtime.is_symlink(&link) {
                if self.runtime.resolve_link(&link).ok().as_deref() == Some(dir) {
                    debug!("{:?} already links to {:?}", link, dir);
                    continue;
                }
                warn!("{:?} is an unmanaged link; not activating '{}'", link, name);
                continue;
            }
            if self.runtime.exists(&link) {
                warn!("{:?} already exists; not activating '{}'", link, name);
                continue;
            }

            debug!("Linking {:?} -> {:?}", link, dir);
            self.runtime
                .symlink(dir, &link)
                .with_context(|| format!("Failed to activate mod '{}'", name))?;
        }

        Ok(())
    }
}

/// Depth-first closure over the store with an explicit stack and visited set.
///
/// Requested names must exist; dependencies that are missing from the store
/// are skipped.
pub fn close_over(
    entries: &BTreeMap<String, StoreEntry>,
    request: &ModRequest,
) -> Result<ActiveLinkSet> {
    let roots: Vec<&str> = match request {
        ModRequest::All => entries.keys().map(String::as_str).collect(),
        ModRequest::Named(name) => {
            if !entries.contains_key(name) {
                return Err(EverlayError::ModNotFound(name.clone()).into());
            }
            vec![name.as_str()]
        }
    };

    let mut active = ActiveLinkSet::default();
    let mut visited: BTreeSet<String> = BTreeSet::new();

    for root in roots {
        let mut stack = vec![root.to_string()];

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }

            let Some(entry) = entries.get(&name) else {
                if RUNTIME_PROVIDED.contains(&name.as_str()) {
                    debug!("'{}' is provided by the runtime", name);
                } else {
                    debug!("Dependency '{}' is not in the mod store, skipping", name);
                }
                continue;
            };

            active.insert(name, entry.dir.clone());

            // Reverse so that dependencies are visited in name order
            for dep in entry.dependencies().into_iter().rev() {
                if !visited.contains(&dep) {
                    stack.push(dep);
                }
            }
        }
    }

    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mods::manifest::ModManifest;
    use crate::runtime::RealRuntime;
    use crate::test_utils::write_mod;
    use tempfile::tempdir;

    fn entry(name: &str, deps: &[&str]) -> (String, StoreEntry) {
        (
            name.to_string(),
            StoreEntry {
                name: name.to_string(),
                dir: PathBuf::from("/store").join(name),
                manifest: Some(ModManifest {
                    name: Some(name.to_string()),
                    dependencies: deps.iter().map(|d| d.to_string()).collect(),
                    ..Default::default()
                }),
            },
        )
    }

    /// `deps` is a comma separated list of dependency names.
    fn store(entries: &[(&str, &str)]) -> BTreeMap<String, StoreEntry> {
        entries
            .iter()
            .map(|(name, deps)| {
                let deps: Vec<&str> = deps.split(',').filter(|d| !d.is_empty()).collect();
                entry(name, &deps)
            })
            .collect()
    }

    #[test]
    fn test_close_over_scenario() {
        let entries = store(&[("A", "B"), ("B", ""), ("C", "")]);

        let a = close_over(&entries, &ModRequest::Named("A".into())).unwrap();
        assert_eq!(a.names(), vec!["A", "B"]);
        assert_eq!(a.get("B"), Some(Path::new("/store/B")));

        let all = close_over(&entries, &ModRequest::All).unwrap();
        assert_eq!(all.names(), vec!["A", "B", "C"]);

        let err = close_over(&entries, &ModRequest::Named("D".into())).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EverlayError>(),
            Some(&EverlayError::ModNotFound("D".into()))
        );
    }

    #[test]
    fn test_close_over_transitive_and_cycles() {
        let entries = store(&[("A", "B"), ("B", "C,A"), ("C", "A,C"), ("Lonely", "")]);

        let active = close_over(&entries, &ModRequest::Named("A".into())).unwrap();
        assert_eq!(active.names(), vec!["A", "B", "C"]);
        assert!(!active.contains("Lonely"));
    }

    #[test]
    fn test_close_over_skips_missing_and_runtime_dependencies() {
        let entries = store(&[("A", "Everest,Celeste,Ghost,B"), ("B", "")]);

        let active = close_over(&entries, &ModRequest::Named("A".into())).unwrap();
        assert_eq!(active.names(), vec!["A", "B"]);
    }

    #[test]
    fn test_close_over_empty_store() {
        let entries = BTreeMap::new();
        assert!(close_over(&entries, &ModRequest::All).unwrap().is_empty());
    }

    #[test]
    fn test_mod_request_from_option() {
        assert_eq!(ModRequest::from(None), ModRequest::All);
        assert_eq!(
            ModRequest::from(Some("A".to_string())),
            ModRequest::Named("A".into())
        );
    }

    #[test]
    fn test_resolve_links_closure() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let store_dir = dir.path().join("mods");
        let active_dir = dir.path().join("merged/Mods");

        write_mod(&store_dir, "a-dir", Some("A"), &["B"]);
        write_mod(&store_dir, "B", Some("B"), &[]);
        write_mod(&store_dir, "C", Some("C"), &[]);

        let linker = DependencyLinker::new(&runtime, store_dir.clone(), active_dir.clone());
        let active = linker.resolve(&ModRequest::Named("A".into())).unwrap();

        assert_eq!(active.names(), vec!["A", "B"]);
        assert!(runtime.is_symlink(&active_dir.join("a-dir")));
        assert_eq!(
            runtime.read_link(&active_dir.join("a-dir")).unwrap(),
            store_dir.join("a-dir")
        );
        assert!(runtime.is_symlink(&active_dir.join("B")));
        assert!(!runtime.exists(&active_dir.join("C")));

        // Linked, not copied
        assert!(!runtime.is_symlink(&store_dir.join("B")));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let store_dir = dir.path().join("mods");
        let active_dir = dir.path().join("Mods");
        write_mod(&store_dir, "A", Some("A"), &[]);

        let linker = DependencyLinker::new(&runtime, store_dir, active_dir.clone());
        linker.resolve(&ModRequest::All).unwrap();
        linker.resolve(&ModRequest::All).unwrap();

        assert_eq!(runtime.read_dir(&active_dir).unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_missing_mod_mutates_nothing() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let store_dir = dir.path().join("mods");
        let active_dir = dir.path().join("Mods");
        write_mod(&store_dir, "A", Some("A"), &[]);

        let linker = DependencyLinker::new(&runtime, store_dir, active_dir.clone());
        let err = linker.resolve(&ModRequest::Named("D".into())).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EverlayError>(),
            Some(EverlayError::ModNotFound(name)) if name == "D"
        ));
        assert!(!runtime.exists(&active_dir));
    }

    #[test]
    fn test_resolve_leaves_unmanaged_entries_alone() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let store_dir = dir.path().join("mods");
        let active_dir = dir.path().join("Mods");
        write_mod(&store_dir, "A", Some("A"), &[]);
        std::fs::create_dir_all(active_dir.join("A")).unwrap();
        std::fs::write(active_dir.join("A/keep.txt"), "mine").unwrap();

        let linker = DependencyLinker::new(&runtime, store_dir, active_dir.clone());
        linker.resolve(&ModRequest::All).unwrap();

        assert!(!runtime.is_symlink(&active_dir.join("A")));
        assert!(runtime.exists(&active_dir.join("A/keep.txt")));
    }
}
