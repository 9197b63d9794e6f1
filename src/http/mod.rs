//! HTTP client used to query the framework's release index.

mod client;

pub use client::HttpClient;
