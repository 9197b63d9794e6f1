//! Building the collaborators commands need from resolved settings.

use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    config::Settings,
    framework::InstallPaths,
    http::HttpClient,
    release::{DEFAULT_FRAMEWORK_REPO, GitHubReleaseIndex},
    runtime::Runtime,
};

/// Build an HTTP client, authenticated with `GITHUB_TOKEN` when it is set.
pub fn build_http_client<R: Runtime>(runtime: &R) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("Using GITHUB_TOKEN for authentication: {}", mask_token(&token));
    }

    let client = Client::builder()
        .user_agent(concat!("everlay/", env!("EVERLAY_VERSION")))
        .default_headers(headers)
        .build()?;

    Ok(HttpClient::new(client))
}

/// Release index for the framework repository.
pub fn build_release_index<R: Runtime>(runtime: &R, settings: &Settings) -> Result<GitHubReleaseIndex> {
    let client = build_http_client(runtime)?;
    Ok(GitHubReleaseIndex::new(
        client,
        settings.index_url.clone(),
        DEFAULT_FRAMEWORK_REPO.parse()?,
    ))
}

pub fn install_paths(settings: &Settings) -> InstallPaths {
    InstallPaths {
        version_file: settings.layout.version_file(),
        build_root: settings.layout.build_dir(),
        game_tree: settings.layout.merged_dir(),
        user_patch: settings.user_patch(),
    }
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
