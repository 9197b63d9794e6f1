use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use super::{ReleaseIndex, RemoteRelease, RepoSlug};
use crate::http::HttpClient;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Release index backed by the GitHub REST API.
///
/// The latest release names a tag; the tag is pinned to a commit so that the
/// same release always fetches the same source.
pub struct GitHubReleaseIndex {
    client: HttpClient,
    api_url: String,
    repo: RepoSlug,
}

#[derive(Deserialize, Debug)]
struct RepoInfo {
    clone_url: String,
}

#[derive(Deserialize, Debug)]
struct LatestRelease {
    tag_name: String,
    published_at: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CommitInfo {
    sha: String,
}

impl GitHubReleaseIndex {
    #[tracing::instrument(skip(client, api_url))]
    pub fn new(client: HttpClient, api_url: Option<String>, repo: RepoSlug) -> Self {
        let api_url = api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            client,
            api_url,
            repo,
        }
    }

    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repo.owner, self.repo.repo)
    }
}

#[async_trait]
impl ReleaseIndex for GitHubReleaseIndex {
    #[tracing::instrument(skip(self))]
    async fn latest(&self) -> Result<RemoteRelease> {
        let repo_url = self.repo_url();
        debug!("Querying latest release of {}", self.repo);

        let info: RepoInfo = self
            .client
            .get_json(&repo_url)
            .await
            .context("Failed to fetch repository information")?;

        let latest: LatestRelease = self
            .client
            .get_json(&format!("{}/releases/latest", repo_url))
            .await
            .context("Failed to fetch latest release")?;

        let commit: CommitInfo = self
            .client
            .get_json(&format!("{}/commits/{}", repo_url, latest.tag_name))
            .await
            .with_context(|| format!("Failed to resolve tag {} to a commit", latest.tag_name))?;

        Ok(RemoteRelease {
            version: latest.tag_name,
            source_url: info.clone_url,
            revision: commit.sha,
            published_at: latest.published_at,
        })
    }
}
