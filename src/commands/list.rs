use anyhow::Result;
use log::debug;

use crate::{config::Settings, mods::ModStore, runtime::Runtime};

/// List the mods in the store with their version and dependencies.
#[tracing::instrument(skip(runtime, settings))]
pub fn list<R: Runtime>(runtime: &R, settings: &Settings) -> Result<()> {
    let store = ModStore::new(runtime, settings.layout.mod_store());
    debug!("Listing mods from {:?}", store.root());

    let entries = store.entries()?;
    if entries.is_empty() {
        println!("No mods in {}.", store.root().display());
        return Ok(());
    }

    for (name, entry) in &entries {
        let manifest = entry.manifest.as_ref();
        let version = manifest
            .and_then(|m| m.version.as_deref())
            .unwrap_or("(unknown)");
        println!("{} {}", name, version);

        if let Some(manifest) = manifest {
            if !manifest.dependencies.is_empty() {
                let deps: Vec<&str> = manifest.dependencies.iter().map(String::as_str).collect();
                println!("    requires: {}", deps.join(", "));
            }
            if !manifest.optional_dependencies.is_empty() {
                let deps: Vec<&str> = manifest
                    .optional_dependencies
                    .iter()
                    .map(String::as_str)
                    .collect();
                println!("    optional: {}", deps.join(", "));
            }
        }
    }

    Ok(())
}
