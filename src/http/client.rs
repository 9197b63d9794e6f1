//! Thin JSON client over reqwest.
//!
//! Requests are issued exactly once; a failed request surfaces to the caller
//! with context and nothing is retried.

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET JSON from {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let response = response
            .error_for_status()
            .with_context(|| format!("Request to {} was rejected", url))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}
