//! Blocking HTTP fetches with bounded retry.
//!
//! Network calls are synchronous and sequential; transient transport
//! failures are retried up to [`MAX_ATTEMPTS`] times with exponential
//! backoff. A non-success HTTP status is a definitive answer from the server
//! and is never retried.

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{BootstrapError, Result};

/// Attempts per fetch before the failure is treated as terminal
const MAX_ATTEMPTS: u32 = 3;
/// Backoff base; attempt n sleeps base * 2^(n-1)
const BACKOFF_BASE: Duration = Duration::from_secs(1);
/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("server-bootstrap/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| BootstrapError::system(format!("failed to build HTTP client: {}", e)))
}

fn get_with_retry(url: &str) -> Result<reqwest::blocking::Response> {
    let client = client()?;
    let mut last_err = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        match client.get(url).send() {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                // Definitive server answer, retrying will not change it
                return Err(BootstrapError::system(format!(
                    "GET {} returned HTTP {}",
                    url, status
                )));
            }
            Err(e) => {
                last_err = e.to_string();
                if attempt < MAX_ATTEMPTS {
                    let backoff = BACKOFF_BASE * 2u32.pow(attempt - 1);
                    warn!(
                        "GET {} failed (attempt {}/{}): {}; retrying in {:?}",
                        url, attempt, MAX_ATTEMPTS, last_err, backoff
                    );
                    std::thread::sleep(backoff);
                }
            }
        }
    }

    Err(BootstrapError::system(format!(
        "GET {} failed after {} attempts: {}",
        url, MAX_ATTEMPTS, last_err
    )))
}

/// Fetch a URL and return its body as text.
pub fn get_text(url: &str) -> Result<String> {
    info!("fetching {}", url);
    let response = get_with_retry(url)?;
    response
        .text()
        .map_err(|e| BootstrapError::system(format!("failed to read body of {}: {}", url, e)))
}

/// Download a URL to a file, returning the number of bytes written.
pub fn download(url: &str, dest: &Path) -> Result<u64> {
    info!("downloading {} -> {}", url, dest.display());
    let response = get_with_retry(url)?;
    let bytes = response
        .bytes()
        .map_err(|e| BootstrapError::system(format!("failed to read body of {}: {}", url, e)))?;
    fs::write(dest, &bytes)?;
    Ok(bytes.len() as u64)
}
