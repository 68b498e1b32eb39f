//! HTTP client for local service probes.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::error::{Result, StatusError};

/// Build a client with a per-request timeout.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(format!("server-status/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| StatusError::Network(e.to_string()))
}

/// Fetch JSON from a URL.
///
/// # Errors
///
/// `Timeout`, `Network` for connection failures and non-2xx statuses, and
/// `Parse` when the body is not the expected JSON.
pub async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<T> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            StatusError::Timeout {
                program: url.to_string(),
                seconds: timeout.as_secs(),
            }
        } else {
            StatusError::Network(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(StatusError::Network(format!(
            "HTTP {} from {}",
            response.status(),
            url
        )));
    }

    response.json().await.map_err(|e| StatusError::Parse {
        what: url.to_string(),
        message: e.to_string(),
    })
}
