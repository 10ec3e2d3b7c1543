//! HTTP client wrapper for downloading the metadata dumps.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{RefineError, Result};

/// User agent string identifying this tool.
const USER_AGENT: &str = concat!("bv-refiner/", env!("CARGO_PKG_VERSION"));

/// Maximum number of attempts for transient failures.
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Create a configured HTTP client.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download a URL, retrying transient failures up to [`MAX_RETRIES`] times.
pub fn download_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    download_bytes_with_retries(client, url, MAX_RETRIES)
}

/// Download a URL with exponential backoff between attempts.
///
/// Connection errors, timeouts and 5xx responses are retried. Client errors
/// (4xx) and anything else fail immediately.
pub fn download_bytes_with_retries(client: &Client, url: &str, attempts: u32) -> Result<Vec<u8>> {
    let mut last_error: Option<String> = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            // 500ms, 1000ms, 2000ms, ...
            let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1));
            tracing::debug!(attempt, delay_ms = delay, "Retrying after delay");
            thread::sleep(Duration::from_millis(delay));
        }

        match client.get(url).send() {
            Ok(response) => {
                let status = response.status();
                if status.is_server_error() {
                    tracing::warn!(
                        %url,
                        status = %status,
                        attempt = attempt + 1,
                        max_retries = attempts,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                let response = response.error_for_status()?;
                let bytes = response.bytes()?;
                return Ok(bytes.to_vec());
            }
            Err(e) if e.is_connect() || e.is_timeout() => {
                tracing::warn!(
                    %url,
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = attempts,
                    "Connection error, will retry"
                );
                last_error = Some(e.to_string());
            }
            Err(e) => return Err(RefineError::Http(e)),
        }
    }

    Err(RefineError::RetriesExhausted {
        attempts,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Download a URL and decode the body as JSON.
///
/// HTTP failures are reported as [`RefineError::MetadataDownload`] with the URL.
pub fn download_json(client: &Client, url: &str) -> Result<serde_json::Value> {
    let bytes = download_bytes(client, url).map_err(|e| match e {
        RefineError::Http(source) => RefineError::MetadataDownload {
            url: url.to_string(),
            source,
        },
        other => other,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}
