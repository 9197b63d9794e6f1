//! Error taxonomy for conditions callers need to tell apart.
//!
//! Everything else travels as plain `anyhow` context.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EverlayError {
    #[error("no Celeste installation configured; pass --game-dir <PATH> once to record it")]
    GameDirMissing,

    #[error("{} does not look like a Celeste installation", .0.display())]
    InvalidGameDir(PathBuf),

    #[error("invalid save namespace '{0}': use a single path component")]
    InvalidSaveNamespace(String),

    #[error("invalid selection '{0}'")]
    InvalidSelection(String),

    #[error("mod '{0}' not found in the mod store")]
    ModNotFound(String),

    #[error("missing required tools: {}", .0.join(", "))]
    ToolingMissing(Vec<String>),

    #[error("`{command}` failed with {status}")]
    CommandFailed { command: String, status: String },

    #[error("version marker not found in {}", .0.display())]
    MarkerNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        assert_eq!(
            EverlayError::ModNotFound("D".into()).to_string(),
            "mod 'D' not found in the mod store"
        );
        assert_eq!(
            EverlayError::ToolingMissing(vec!["git".into(), "dotnet or msbuild".into()])
                .to_string(),
            "missing required tools: git, dotnet or msbuild"
        );
    }
}
