use anyhow::Result;

use crate::{config::Settings, overlay::Overlay, runtime::Runtime};

/// Make sure the overlay is mounted, nothing else.
#[tracing::instrument(skip(runtime, settings))]
pub fn mount<R: Runtime>(runtime: &R, settings: &Settings) -> Result<()> {
    let overlay = Overlay::new(runtime, settings.game_dir()?, &settings.layout);
    if !overlay.ensure_mounted()? {
        println!("   {} is already mounted", overlay.merged().display());
    }
    Ok(())
}
