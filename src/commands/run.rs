use anyhow::Result;
use log::debug;

use crate::{
    config::Settings,
    framework::{InstallOrchestrator, VersionStore},
    launch::launch,
    mods::{DependencyLinker, LinkSetSynchronizer, ModRequest},
    overlay::Overlay,
    release::ReleaseIndex,
    runtime::Runtime,
};

use super::services::{build_release_index, install_paths};

/// Mount, install the framework if it was never installed, rebuild the
/// active mod set and launch the game.
#[tracing::instrument(skip(runtime, settings))]
pub async fn run<R: Runtime>(runtime: &R, settings: &Settings) -> Result<()> {
    let index = build_release_index(runtime, settings)?;
    let request = ModRequest::from(settings.requested_mod.clone());
    start(runtime, &index, settings, &request).await
}

pub(crate) async fn start<R: Runtime, I: ReleaseIndex>(
    runtime: &R,
    index: &I,
    settings: &Settings,
    request: &ModRequest,
) -> Result<()> {
    let layout = &settings.layout;
    let game_dir = settings.game_dir()?;

    Overlay::new(runtime, game_dir, layout).ensure_mounted()?;

    let versions = VersionStore::new(runtime, layout.version_file());
    if versions.load()?.is_none() {
        println!("   Everest is not installed yet");
        InstallOrchestrator::new(runtime, index, install_paths(settings))
            .run(true)
            .await?;
    }

    let report = LinkSetSynchronizer::new(
        runtime,
        layout.active_mods_dir(),
        layout.mod_store(),
        layout.conflicts_dir(),
    )
    .synchronize()?;
    debug!("Synchronized active mods: {:?}", report);
    if !report.migrated.is_empty() {
        println!(
            "   moved {} into {}",
            report.migrated.join(", "),
            layout.mod_store().display()
        );
    }
    if !report.conflicted.is_empty() {
        eprintln!(
            "Warning: {} already in the mod store; the old copies were moved to {}",
            report.conflicted.join(", "),
            layout.conflicts_dir().display()
        );
    }

    let active = DependencyLinker::new(runtime, layout.mod_store(), layout.active_mods_dir())
        .resolve(request)?;
    println!("   {} mod(s) active", active.len());

    launch(runtime, &layout.merged_dir(), &settings.save_dir())
}
