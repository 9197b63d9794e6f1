//! Resolved configuration and the on-disk state layout.
//!
//! Nothing here reads ambient state directly: directories and environment
//! variables come through the [`Runtime`], and everything downstream receives
//! an explicit [`Settings`].

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::EverlayError;
use crate::framework::USER_PATCH_FILE_NAME;
use crate::runtime::Runtime;
use crate::runtime::path::normalize_path;

/// Directory name used under the platform data and config directories.
pub const APP_DIR_NAME: &str = "everlay";
pub const DEFAULT_SAVE_NAMESPACE: &str = "default";
const PATH_CONFIG_FILE_NAME: &str = "config.json";

/// Files whose presence identifies a Celeste installation.
const GAME_MARKERS: [&str; 3] = ["Celeste.dll", "Celeste.exe", "Celeste"];

/// Paths of everything persisted under the data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_file(&self) -> PathBuf {
        self.root.join("everest-version")
    }

    pub fn mod_store(&self) -> PathBuf {
        self.root.join("mods")
    }

    pub fn upper_dir(&self) -> PathBuf {
        self.root.join("overlay").join("upper")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.join("overlay").join("work")
    }

    pub fn merged_dir(&self) -> PathBuf {
        self.root.join("overlay").join("merged")
    }

    /// The game's `Mods` directory as seen through the overlay.
    pub fn active_mods_dir(&self) -> PathBuf {
        self.merged_dir().join("Mods")
    }

    pub fn saves_dir(&self, namespace: &str) -> PathBuf {
        self.root.join("saves").join(namespace)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    pub fn conflicts_dir(&self) -> PathBuf {
        self.root.join("conflicts")
    }
}

/// Persisted path configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_dir: Option<PathBuf>,
}

impl PathConfig {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        if !runtime.exists(path) {
            return Ok(Self::default());
        }
        let content = runtime.read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    #[tracing::instrument(skip(runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            runtime.create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        runtime
            .write(path, json.as_bytes())
            .with_context(|| format!("Failed to write {:?}", path))
    }
}

/// Values given on the command line, before resolution.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub game_dir: Option<PathBuf>,
    pub save_namespace: Option<String>,
    pub requested_mod: Option<String>,
    pub index_url: Option<String>,
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub layout: StateLayout,
    pub config_dir: PathBuf,
    pub game_dir: Option<PathBuf>,
    pub save_namespace: String,
    pub requested_mod: Option<String>,
    pub index_url: Option<String>,
}

impl Settings {
    /// Resolve overrides against the persisted path config and platform
    /// defaults. A game directory passed explicitly is validated and saved.
    #[tracing::instrument(skip(runtime))]
    pub fn resolve<R: Runtime>(runtime: &R, overrides: Overrides) -> Result<Self> {
        let config_dir = runtime
            .config_dir()
            .ok_or_else(|| anyhow!("Cannot determine the configuration directory"))?
            .join(APP_DIR_NAME);

        let root = match overrides.root {
            Some(root) => absolutize(runtime, &root)?,
            None => runtime
                .data_dir()
                .ok_or_else(|| anyhow!("Cannot determine the data directory; pass --root"))?
                .join(APP_DIR_NAME),
        };
        debug!("Data root: {:?}", root);

        let save_namespace = overrides
            .save_namespace
            .unwrap_or_else(|| DEFAULT_SAVE_NAMESPACE.to_string());
        validate_save_namespace(&save_namespace)?;

        let config_path = config_dir.join(PATH_CONFIG_FILE_NAME);
        let mut path_config = PathConfig::load(runtime, &config_path)?;

        let game_dir = match overrides.game_dir {
            Some(dir) => {
                let dir = absolutize(runtime, &dir)?;
                validate_game_dir(runtime, &dir)?;
                if path_config.game_dir.as_ref() != Some(&dir) {
                    info!("Recording game directory {:?} in {:?}", dir, config_path);
                    path_config.game_dir = Some(dir.clone());
                    path_config.save(runtime, &config_path)?;
                }
                Some(dir)
            }
            None => match path_config.game_dir {
                Some(dir) => {
                    validate_game_dir(runtime, &dir)?;
                    Some(dir)
                }
                None => None,
            },
        };

        Ok(Self {
            layout: StateLayout::new(root),
            config_dir,
            game_dir,
            save_namespace,
            requested_mod: overrides.requested_mod,
            index_url: overrides.index_url,
        })
    }

    /// The base installation; required by anything that mounts or launches.
    pub fn game_dir(&self) -> Result<&Path> {
        self.game_dir
            .as_deref()
            .ok_or_else(|| EverlayError::GameDirMissing.into())
    }

    pub fn user_patch(&self) -> PathBuf {
        self.config_dir.join(USER_PATCH_FILE_NAME)
    }

    pub fn save_dir(&self) -> PathBuf {
        self.layout.saves_dir(&self.save_namespace)
    }
}

/// Anchor a path given on the command line to the current directory.
///
/// Links into the mod store and mount points are compared as absolute
/// paths, and the game directory is persisted for later runs.
fn absolutize<R: Runtime>(runtime: &R, path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    Ok(normalize_path(&runtime.current_dir()?.join(path)))
}

/// A base installation must be a directory holding the game's binaries.
pub fn validate_game_dir<R: Runtime>(runtime: &R, dir: &Path) -> Result<()> {
    let looks_right =
        runtime.is_dir(dir) && GAME_MARKERS.iter().any(|m| runtime.exists(&dir.join(m)));
    if looks_right {
        Ok(())
    } else {
        Err(EverlayError::InvalidGameDir(dir.to_path_buf()).into())
    }
}

/// Save namespaces become a single directory under `saves/`.
pub fn validate_save_namespace(namespace: &str) -> Result<()> {
    let mut components = Path::new(namespace).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if namespace.is_empty() || !single_normal || namespace.contains(['/', '\\']) {
        return Err(EverlayError::InvalidSaveNamespace(namespace.to_string()).into());
    }
    Ok(())
}
