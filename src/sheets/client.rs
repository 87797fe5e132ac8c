use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::http;

pub const DEFAULT_API_URL: &str = "https://sheets.googleapis.com/v4";

#[derive(Debug, Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
  #[serde(default)]
  sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
  properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
  title: String,
}

/// Sheets API v4 client bound to one spreadsheet
pub struct SheetsClient {
  http: Client,
  base_url: String,
  spreadsheet_id: String,
  access_token: String,
}

impl SheetsClient {
  pub fn new(
    base_url: &str,
    spreadsheet_id: &str,
    access_token: String,
    timeout: Duration,
  ) -> Result<Self> {
    Ok(Self {
      http: http::build_client(timeout)?,
      base_url: base_url.trim_end_matches('/').to_string(),
      spreadsheet_id: spreadsheet_id.to_string(),
      access_token,
    })
  }

  pub fn spreadsheet_id(&self) -> &str {
    &self.spreadsheet_id
  }

  /// `{base}/spreadsheets/{id}{suffix}/{segments...}` with each segment percent-encoded
  fn url(&self, suffix: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(&self.base_url)
      .map_err(|e| Error::config(format!("invalid Sheets API url {}: {}", self.base_url, e)))?;
    {
      let mut path = url
        .path_segments_mut()
        .map_err(|_| Error::config(format!("invalid Sheets API url {}", self.base_url)))?;
      path.pop_if_empty();
      path.push("spreadsheets");
      path.push(&format!("{}{}", self.spreadsheet_id, suffix));
      path.extend(segments);
    }
    Ok(url)
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    self
      .http
      .request(method, url)
      .bearer_auth(&self.access_token)
  }

  /// Cell values of `range`, rendered as strings
  pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
    let url = self.url("", &["values", range])?;
    let response = self.request(Method::GET, url).send().await?;
    let body: ValueRange = http::json(response).await?;

    Ok(
      body
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect(),
    )
  }

  /// Write `rows` starting at `range`; input is parsed as if typed by a user.
  pub async fn update_values(&self, range: &str, rows: &[Vec<String>]) -> Result<()> {
    let mut url = self.url("", &["values", range])?;
    url
      .query_pairs_mut()
      .append_pair("valueInputOption", "USER_ENTERED");

    let response = self
      .request(Method::PUT, url)
      .json(&json!({ "values": rows }))
      .send()
      .await?;
    http::check(response).await?;
    Ok(())
  }

  pub async fn sheet_titles(&self) -> Result<Vec<String>> {
    let mut url = self.url("", &[])?;
    url
      .query_pairs_mut()
      .append_pair("fields", "sheets.properties.title");

    let response = self.request(Method::GET, url).send().await?;
    let meta: SpreadsheetMeta = http::json(response).await?;
    Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
  }

  /// Add a sheet named `title` unless one exists. Returns true if it was created.
  pub async fn check_or_create_sheet(&self, title: &str) -> Result<bool> {
    if self.sheet_titles().await?.iter().any(|t| t == title) {
      warn!(title, "sheet already exists, no new sheet was created");
      return Ok(false);
    }

    let url = self.url(":batchUpdate", &[])?;
    let body = json!({
      "requests": [{ "addSheet": { "properties": { "title": title } } }]
    });
    let response = self.request(Method::POST, url).json(&body).send().await?;
    http::check(response).await?;

    info!(title, "sheet created");
    Ok(true)
  }
}

fn cell_to_string(value: serde_json::Value) -> String {
  match value {
    serde_json::Value::String(s) => s,
    serde_json::Value::Null => String::new(),
    other => other.to_string(),
  }
}
