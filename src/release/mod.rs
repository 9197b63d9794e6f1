//! Discovery of the latest framework release.

mod github;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::str::FromStr;

pub use github::GitHubReleaseIndex;

/// Repository hosting the framework source.
pub const DEFAULT_FRAMEWORK_REPO: &str = "EverestAPI/Everest";

/// A release as seen on the index. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteRelease {
    /// Opaque version token, compared as a string.
    pub version: String,
    /// Where the source can be fetched from (a git remote).
    pub source_url: String,
    /// The exact commit the release was built from.
    pub revision: String,
    pub published_at: Option<String>,
}

impl RemoteRelease {
    /// Short revision prefix used in local build markers.
    pub fn short_revision(&self) -> &str {
        let end = self
            .revision
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.revision.len());
        &self.revision[..end]
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseIndex: Send + Sync {
    /// Fetch the newest published release.
    async fn latest(&self) -> Result<RemoteRelease>;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoSlug {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(RepoSlug {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(anyhow!("Invalid repository '{}'. Expected 'owner/repo'.", s)),
        }
    }
}
