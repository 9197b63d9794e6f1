use anyhow::Result;

use crate::{
    config::Settings,
    framework::{InstallOrchestrator, Outcome},
    overlay::Overlay,
    release::ReleaseIndex,
    runtime::Runtime,
};

use super::services::{build_release_index, install_paths};

/// Check for a newer Everest release and install it. `yes` skips the prompt.
#[tracing::instrument(skip(runtime, settings))]
pub async fn update<R: Runtime>(runtime: &R, settings: &Settings, yes: bool) -> Result<()> {
    let index = build_release_index(runtime, settings)?;
    update_from(runtime, &index, settings, yes).await.map(|_| ())
}

pub(crate) async fn update_from<R: Runtime, I: ReleaseIndex>(
    runtime: &R,
    index: &I,
    settings: &Settings,
    yes: bool,
) -> Result<Outcome> {
    Overlay::new(runtime, settings.game_dir()?, &settings.layout).ensure_mounted()?;

    let outcome = InstallOrchestrator::new(runtime, index, install_paths(settings))
        .run(yes)
        .await?;
    if outcome == Outcome::UpToDate {
        println!("Everest is up to date.");
    }
    Ok(outcome)
}
