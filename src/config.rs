use chrono_tz::Tz;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::SqliteStorage;
use crate::matching::MatcherConfig;
use crate::{clockify, matching, sheets, toggl, wrike};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub jira_instances: Vec<JiraInstance>,
  pub wrike: WrikeConfig,
  pub toggl: TogglConfig,
  pub clockify: ClockifyConfig,
  pub google_sheets: SheetsConfig,
  pub openai: OpenAiConfig,
  /// Memo cache location (defaults to the user cache directory)
  pub cache_dir: Option<PathBuf>,
  pub log_dir: PathBuf,
  /// IANA zone that naive sheet/CSV timestamps are in
  pub timezone: String,
  pub request_timeout_secs: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      jira_instances: Vec::new(),
      wrike: WrikeConfig::default(),
      toggl: TogglConfig::default(),
      clockify: ClockifyConfig::default(),
      google_sheets: SheetsConfig::default(),
      openai: OpenAiConfig::default(),
      cache_dir: None,
      log_dir: PathBuf::from("logs"),
      timezone: "America/Montreal".to_string(),
      request_timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraInstance {
  pub name: String,
  pub base_url: String,
  pub user_email: String,
  /// Falls back to JIRA_API_TOKEN when not set
  #[serde(default)]
  pub api_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WrikeConfig {
  pub api_url: String,
  /// Folders or projects exported by `sheets sync-wrike`
  pub folder_ids: Vec<String>,
}

impl Default for WrikeConfig {
  fn default() -> Self {
    Self {
      api_url: wrike::DEFAULT_API_URL.to_string(),
      folder_ids: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TogglConfig {
  pub api_url: String,
  pub workspace_id: Option<i64>,
}

impl Default for TogglConfig {
  fn default() -> Self {
    Self {
      api_url: toggl::DEFAULT_API_URL.to_string(),
      workspace_id: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockifyConfig {
  pub api_url: String,
  pub workspace_id: Option<String>,
}

impl Default for ClockifyConfig {
  fn default() -> Self {
    Self {
      api_url: clockify::DEFAULT_API_URL.to_string(),
      workspace_id: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
  pub api_url: String,
  pub spreadsheet_id: Option<String>,
  /// OAuth token file, refreshed in place
  pub token_file: PathBuf,
}

impl Default for SheetsConfig {
  fn default() -> Self {
    Self {
      api_url: sheets::DEFAULT_API_URL.to_string(),
      spreadsheet_id: None,
      token_file: PathBuf::from("token.json"),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
  pub api_url: String,
  pub model: String,
  pub batch_size: usize,
  pub temperature: f32,
  pub max_tokens: u32,
}

impl Default for OpenAiConfig {
  fn default() -> Self {
    let matcher = MatcherConfig::default();
    Self {
      api_url: matching::DEFAULT_API_URL.to_string(),
      model: matcher.model,
      batch_size: matcher.batch_size,
      temperature: matcher.temperature,
      max_tokens: matcher.max_tokens,
    }
  }
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./timesync.yaml (current directory)
  /// 3. ./config.yaml
  /// 4. $XDG_CONFIG_HOME/timesync/config.yaml
  ///
  /// Without a file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    for name in ["timesync.yaml", "config.yaml"] {
      let local = PathBuf::from(name);
      if local.exists() {
        return Some(local);
      }
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("timesync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Environment variables take precedence over the file.
  fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("WRIKE_API_URL") {
      self.wrike.api_url = url;
    }
    if let Some(ids) = lookup("WRIKE_FOLDER_IDS") {
      self.wrike.folder_ids = ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    }
    if let Some(dir) = lookup("WRIKE_DISK_CACHE_DIR") {
      self.cache_dir = Some(PathBuf::from(dir));
    }
    if let Some(url) = lookup("TOGGL_API_URL") {
      self.toggl.api_url = url;
    }
    if let Some(url) = lookup("CLOCKIFY_API_URL") {
      self.clockify.api_url = url;
    }
    if let Some(id) = lookup("DEFAULT_GOOGLE_SHEET_ID") {
      self.google_sheets.spreadsheet_id = Some(id);
    }
  }

  pub fn timezone(&self) -> Result<Tz> {
    self
      .timezone
      .parse::<Tz>()
      .map_err(|e| eyre!("Invalid timezone {}: {}", self.timezone, e))
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs.max(1))
  }

  pub fn cache_dir(&self) -> Result<PathBuf> {
    match &self.cache_dir {
      Some(dir) => Ok(dir.clone()),
      None => Ok(SqliteStorage::default_dir()?),
    }
  }

  /// Look up a Jira instance by name; `default` is the first one configured.
  pub fn jira_instance(&self, name: &str) -> Result<&JiraInstance> {
    if name == "default" {
      return self
        .jira_instances
        .first()
        .ok_or_else(|| eyre!("No Jira instances configured"));
    }

    self
      .jira_instances
      .iter()
      .find(|i| i.name == name)
      .ok_or_else(|| eyre!("Unknown Jira instance: {}", name))
  }

  pub fn spreadsheet_id(&self) -> Result<&str> {
    self.google_sheets.spreadsheet_id.as_deref().ok_or_else(|| {
      eyre!("No spreadsheet configured. Set google_sheets.spreadsheet_id or DEFAULT_GOOGLE_SHEET_ID.")
    })
  }

  pub fn matcher_config(&self) -> MatcherConfig {
    MatcherConfig {
      model: self.openai.model.clone(),
      batch_size: self.openai.batch_size,
      temperature: self.openai.temperature,
      max_tokens: self.openai.max_tokens,
    }
  }

  /// Get the Jira API token for an instance.
  ///
  /// Uses the inline token when present, JIRA_API_TOKEN otherwise.
  pub fn jira_token(instance: &JiraInstance) -> Result<String> {
    match &instance.api_token {
      Some(token) => Ok(token.clone()),
      None => secret("JIRA_API_TOKEN"),
    }
  }

  pub fn wrike_token() -> Result<String> {
    secret("WRIKE_ACCESS_TOKEN")
  }

  pub fn toggl_api_key() -> Result<String> {
    secret("TOGGL_API_KEY")
  }

  pub fn clockify_api_key() -> Result<String> {
    secret("CLOCKIFY_API_KEY")
  }

  pub fn openai_api_key() -> Result<String> {
    secret("OPENAI_API_KEY")
  }
}

fn secret(var: &str) -> Result<String> {
  std::env::var(var).map_err(|_| eyre!("{} not found. Set the {} environment variable.", var, var))
}
