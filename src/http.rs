//! Shared HTTP plumbing for the REST adapters.

use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

use crate::error::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a client with a bounded request timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
  Client::builder()
    .timeout(timeout)
    .user_agent(concat!("timesync/", env!("CARGO_PKG_VERSION")))
    .build()
    .map_err(Error::from)
}

/// Turn a non-2xx response into `Error::Remote`, carrying status and body.
pub async fn check(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let url = response.url().to_string();
  let body = response.text().await.unwrap_or_default();
  warn!(status = status.as_u16(), %url, %body, "remote request failed");

  Err(Error::Remote {
    status: Some(status.as_u16()),
    body,
  })
}

/// Check the status and decode a JSON body.
pub async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
  let response = check(response).await?;
  let bytes = response.bytes().await?;
  Ok(serde_json::from_slice(&bytes)?)
}

/// Emit everything an operator needs to diagnose a failed lookup.
///
/// Credentials in the request headers are redacted.
pub fn log_diagnostics(err: &Error, url: &str, headers: &HeaderMap) {
  let headers = redact(headers);
  match err {
    Error::Remote { status, body } => {
      warn!(
        status = status.unwrap_or_default(),
        %body,
        %url,
        ?headers,
        "Unable to process API request"
      );
    }
    other => warn!(error = %other, %url, ?headers, "Unable to process API request"),
  }
}

fn redact(headers: &HeaderMap) -> Vec<(String, String)> {
  headers
    .iter()
    .map(|(name, value)| {
      let shown = match name.as_str() {
        "authorization" | "x-api-key" => "<redacted>".to_string(),
        _ => value.to_str().unwrap_or("<binary>").to_string(),
      };
      (name.to_string(), shown)
    })
    .collect()
}
