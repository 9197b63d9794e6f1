//! Reading `everest.yaml` mod manifests.
//!
//! A manifest is a YAML sequence of mod declarations, of which only the first
//! one is used:
//!
//! ```yaml
//! - Name: SpringCollab2020
//!   Version: 1.7.2
//!   Dependencies:
//!     - Name: Everest
//!       Version: 1.2707.0
//!     - Name: CollabUtils2
//!       Version: 1.3.11
//! ```
//!
//! Manifests are written by hand, so reading is lenient: a leading byte-order
//! mark is ignored, key order does not matter, and a document that is not
//! valid YAML is scanned line by line for `Name` entries nested under a
//! `Dependencies` list.

use anyhow::{Result, bail};
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::runtime::Runtime;

/// File names probed for a manifest, in order.
pub const MANIFEST_FILE_NAMES: [&str; 2] = ["everest.yaml", "everest.yml"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub dependencies: BTreeSet<String>,
    /// Informational only; optional dependencies are never linked.
    pub optional_dependencies: BTreeSet<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "PascalCase")]
struct Declaration {
    name: Option<Value>,
    version: Option<Value>,
    dependencies: Option<Vec<DependencyEntry>>,
    optional_dependencies: Option<Vec<DependencyEntry>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct DependencyEntry {
    name: Option<Value>,
}

impl ModManifest {
    /// Parse manifest text.
    ///
    /// Fails only when the text is neither valid YAML nor contains anything
    /// recognisable as a declaration.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        match serde_yaml::from_str::<Vec<Declaration>>(text) {
            Ok(declarations) => Ok(declarations
                .into_iter()
                .next()
                .map(Self::from_declaration)
                .unwrap_or_default()),
            Err(e) => {
                debug!("Manifest is not valid YAML ({}), scanning lines", e);
                let scanned = scan_lines(text);
                if scanned.name.is_none() && scanned.dependencies.is_empty() {
                    bail!("Unreadable manifest: {}", e);
                }
                Ok(scanned)
            }
        }
    }

    fn from_declaration(declaration: Declaration) -> Self {
        let names = |entries: Option<Vec<DependencyEntry>>| -> BTreeSet<String> {
            entries
                .unwrap_or_default()
                .into_iter()
                .filter_map(|entry| entry.name.as_ref().and_then(scalar_to_string))
                .collect()
        };

        ModManifest {
            name: declaration.name.as_ref().and_then(scalar_to_string),
            version: declaration.version.as_ref().and_then(scalar_to_string),
            dependencies: names(declaration.dependencies),
            optional_dependencies: names(declaration.optional_dependencies),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn list_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<indent>\s*)(?P<dash>-\s+)?(?P<key>OptionalDependencies|Dependencies)\s*:\s*$")
            .expect("valid regex")
    })
}

fn name_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(?:-\s*)?Name\s*:\s*["']?(?P<name>[^"'#]*?)["']?\s*(?:#.*)?$"#)
            .expect("valid regex")
    })
}

#[derive(Clone, Copy, PartialEq)]
enum Block {
    Required,
    Optional,
}

/// Structural line scan used when the document is not valid YAML.
fn scan_lines(text: &str) -> ModManifest {
    let mut manifest = ModManifest::default();
    let mut block: Option<(Block, usize)> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = line.len() - trimmed.len();

        if let Some(caps) = list_marker().captures(line) {
            let depth = caps["indent"].len() + caps.name("dash").map_or(0, |d| d.len());
            let kind = if &caps["key"] == "Dependencies" {
                Block::Required
            } else {
                Block::Optional
            };
            block = Some((kind, depth));
            continue;
        }

        if let Some((_, depth)) = block {
            let leaves = indent < depth || (indent == depth && !trimmed.starts_with('-'));
            if leaves {
                block = None;
            }
        }

        let Some(caps) = name_field().captures(line) else {
            continue;
        };
        let name = caps["name"].trim().to_string();
        if name.is_empty() {
            continue;
        }

        match block {
            Some((Block::Required, _)) => {
                manifest.dependencies.insert(name);
            }
            Some((Block::Optional, _)) => {
                manifest.optional_dependencies.insert(name);
            }
            None => {
                if manifest.name.is_none() {
                    manifest.name = Some(name);
                }
            }
        }
    }

    manifest
}

/// Reads manifests out of mod directories. All failures are soft.
pub struct ManifestReader<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> ManifestReader<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Locate the manifest file of a mod directory, if any.
    pub fn find(&self, mod_dir: &Path) -> Option<PathBuf> {
        MANIFEST_FILE_NAMES
            .iter()
            .map(|name| mod_dir.join(name))
            .find(|path| self.runtime.exists(path))
    }

    /// Read and parse the manifest of a mod directory.
    ///
    /// Returns `None` when there is no manifest or it cannot be read.
    #[tracing::instrument(skip(self))]
    pub fn read(&self, mod_dir: &Path) -> Option<ModManifest> {
        let path = self.find(mod_dir)?;

        let text = match self.runtime.read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot read {:?}: {}", path, e);
                return None;
            }
        };

        match ModManifest::parse(&text) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!("Ignoring malformed manifest {:?}: {}", path, e);
                None
            }
        }
    }

    /// Dependency names declared by the mod in `mod_dir`; empty when unknown.
    pub fn dependencies(&self, mod_dir: &Path) -> BTreeSet<String> {
        self.read(mod_dir)
            .map(|manifest| manifest.dependencies)
            .unwrap_or_default()
    }
}
