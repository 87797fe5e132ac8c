//! OAuth token file for the Sheets API.
//!
//! The file is created by an out-of-band authorization and holds the client
//! credentials plus a refresh token. Expired access tokens are refreshed and
//! written back.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::http;

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
  pub client_id: String,
  pub client_secret: String,
  pub refresh_token: String,
  #[serde(default)]
  pub access_token: Option<String>,
  #[serde(default)]
  pub expiry: Option<DateTime<Utc>>,
  #[serde(default)]
  pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
  access_token: String,
  expires_in: i64,
}

pub struct TokenStore {
  path: PathBuf,
  token: StoredToken,
  token_url: String,
}

impl TokenStore {
  pub fn load(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Err(Error::config(format!(
        "Google token file {} not found; authorize the application first",
        path.display()
      )));
    }

    let contents = std::fs::read_to_string(path)?;
    let token: StoredToken = serde_json::from_str(&contents)?;

    let granted: BTreeSet<&str> = token.scopes.iter().map(String::as_str).collect();
    let wanted: BTreeSet<&str> = SCOPES.iter().copied().collect();
    if granted != wanted {
      return Err(Error::config(format!(
        "Scopes in {} have changed; re-authorize the application",
        path.display()
      )));
    }

    Ok(Self {
      path: path.to_path_buf(),
      token,
      token_url: TOKEN_URL.to_string(),
    })
  }

  #[cfg(test)]
  pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
    self.token_url = token_url.into();
    self
  }

  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    match (&self.token.access_token, self.token.expiry) {
      (Some(_), Some(expiry)) => expiry - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) <= now,
      (Some(_), None) => false,
      (None, _) => true,
    }
  }

  /// A valid access token, refreshing it first when expired.
  pub async fn access_token(&mut self, http: &Client) -> Result<String> {
    if !self.is_expired(Utc::now()) {
      if let Some(token) = &self.token.access_token {
        return Ok(token.clone());
      }
    }

    debug!(token_url = %self.token_url, "refreshing google access token");
    let form = [
      ("client_id", self.token.client_id.as_str()),
      ("client_secret", self.token.client_secret.as_str()),
      ("refresh_token", self.token.refresh_token.as_str()),
      ("grant_type", "refresh_token"),
    ];
    let response = http.post(&self.token_url).form(&form).send().await?;
    let refreshed: RefreshResponse = http::json(response).await?;

    self.token.access_token = Some(refreshed.access_token.clone());
    self.token.expiry = Some(Utc::now() + ChronoDuration::seconds(refreshed.expires_in));
    self.save()?;
    info!(path = %self.path.display(), "google access token refreshed");

    Ok(refreshed.access_token)
  }

  fn save(&self) -> Result<()> {
    let contents = serde_json::to_string_pretty(&self.token)?;
    std::fs::write(&self.path, contents)?;
    Ok(())
  }
}
