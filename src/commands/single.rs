use anyhow::{Result, bail};

use crate::{
    config::{Settings, validate_save_namespace},
    error::EverlayError,
    mods::{ModRequest, ModStore},
    release::ReleaseIndex,
    runtime::Runtime,
};

use super::run::start;
use super::services::build_release_index;

/// Pick one mod from the store and play it alone, with its own saves.
#[tracing::instrument(skip(runtime, settings))]
pub async fn single<R: Runtime>(runtime: &R, settings: &Settings) -> Result<()> {
    let index = build_release_index(runtime, settings)?;
    single_from(runtime, &index, settings).await
}

pub(crate) async fn single_from<R: Runtime, I: ReleaseIndex>(
    runtime: &R,
    index: &I,
    settings: &Settings,
) -> Result<()> {
    // Fail before prompting if nothing could be launched anyway
    settings.game_dir()?;

    let store = ModStore::new(runtime, settings.layout.mod_store());
    let names: Vec<String> = store.entries()?.into_keys().collect();
    if names.is_empty() {
        bail!("The mod store at {} is empty", store.root().display());
    }

    let name = select_mod(runtime, &names)?;
    let namespace = format!("single-{}", name);
    validate_save_namespace(&namespace)?;

    let settings = Settings {
        save_namespace: namespace,
        requested_mod: Some(name.clone()),
        ..settings.clone()
    };
    start(runtime, index, &settings, &ModRequest::Named(name)).await
}

/// Show a numbered menu and read the choice, by number or exact name.
pub fn select_mod<R: Runtime>(runtime: &R, names: &[String]) -> Result<String> {
    for (i, name) in names.iter().enumerate() {
        println!("{:>4}) {}", i + 1, name);
    }
    let answer = runtime.prompt(&format!("Select a mod [1-{}]:", names.len()))?;
    parse_selection(&answer, names)
}

fn parse_selection(answer: &str, names: &[String]) -> Result<String> {
    let answer = answer.trim();
    if let Ok(number) = answer.parse::<usize>() {
        if (1..=names.len()).contains(&number) {
            return Ok(names[number - 1].clone());
        }
    } else if let Some(name) = names.iter().find(|n| *n == answer) {
        return Ok(name.clone());
    }
    Err(EverlayError::InvalidSelection(answer.to_string()).into())
}
