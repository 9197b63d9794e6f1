//! Starting the game from the merged tree.

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use crate::error::EverlayError;
use crate::runtime::{Invocation, Runtime, run_checked};

/// Variable the framework reads to locate the save directory.
pub const SAVE_PATH_ENV: &str = "EVEREST_SAVEPATH";

/// Build the game invocation: the native launcher when present, otherwise
/// `Celeste.exe` through `mono`.
pub fn game_invocation<R: Runtime>(
    runtime: &R,
    game_tree: &Path,
    save_dir: &Path,
) -> Result<Invocation> {
    let native = game_tree.join("Celeste");
    let invocation = if runtime.exists(&native) && !runtime.is_dir(&native) {
        Invocation::new(native.to_string_lossy())
    } else if runtime.exists(&game_tree.join("Celeste.exe")) {
        if runtime.find_program("mono").is_none() {
            return Err(EverlayError::ToolingMissing(vec!["mono".to_string()]).into());
        }
        Invocation::new("mono").arg("Celeste.exe")
    } else {
        return Err(EverlayError::InvalidGameDir(game_tree.to_path_buf()).into());
    };

    Ok(invocation
        .current_dir(game_tree)
        .env(SAVE_PATH_ENV, save_dir.to_string_lossy()))
}

/// Run the game to completion with saves kept in `save_dir`.
#[tracing::instrument(skip(runtime))]
pub fn launch<R: Runtime>(runtime: &R, game_tree: &Path, save_dir: &Path) -> Result<()> {
    runtime
        .create_dir_all(save_dir)
        .with_context(|| format!("Failed to create save directory {:?}", save_dir))?;

    let invocation = game_invocation(runtime, game_tree, save_dir)?;
    println!("   launching Celeste (saves in {})", save_dir.display());
    info!("Launching `{}`", invocation);
    run_checked(runtime, &invocation)
}
