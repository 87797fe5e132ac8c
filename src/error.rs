//! Error types shared by the service adapters, the cache and the sync engine.

use thiserror::Error;

/// Result type alias for adapter and sync operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  /// Date did not match `YYYY-MM-DD`
  #[error("The date must be in YYYY-MM-DD format, but got {value}")]
  InvalidDateFormat { value: String },

  /// Start date is after end date
  #[error("The start date {start} cannot be later than the end date {end}")]
  InvalidRange { start: String, end: String },

  /// Task ID failed the alphanumeric (or issue key) pattern
  #[error("Invalid task ID format: {value}")]
  InvalidTaskId { value: String },

  #[error("Invalid hours value: {value}")]
  InvalidHours { value: String },

  /// Non-success HTTP response, or a transport failure when `status` is None
  #[error("{}", remote_message(*status, body))]
  Remote { status: Option<u16>, body: String },

  /// Failure reported by the Jira SDK
  #[error("Jira error: {message}")]
  Jira { message: String },

  /// Row has fewer columns than the layout requires
  #[error("missing fields: expected at least {expected}, got {actual}")]
  MissingFields { expected: usize, actual: usize },

  /// None of the accepted datetime formats matched
  #[error("unparseable datetime: {value}")]
  ParseFailure { value: String },

  #[error("Cache error: {message}")]
  Cache { message: String },

  #[error("Configuration error: {message}")]
  Config { message: String },

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),
}

fn remote_message(status: Option<u16>, body: &str) -> String {
  match status {
    Some(code) => format!("Remote call failed with HTTP {}: {}", code, body),
    None => format!("Remote call failed: {}", body),
  }
}

impl Error {
  pub fn cache(message: impl Into<String>) -> Self {
    Self::Cache {
      message: message.into(),
    }
  }

  pub fn config(message: impl Into<String>) -> Self {
    Self::Config {
      message: message.into(),
    }
  }

  pub fn jira(message: impl std::fmt::Display) -> Self {
    Self::Jira {
      message: message.to_string(),
    }
  }

  /// True for failures coming back from a remote service rather than local validation.
  pub fn is_remote(&self) -> bool {
    matches!(self, Self::Remote { .. } | Self::Jira { .. })
  }
}

impl From<reqwest::Error> for Error {
  fn from(err: reqwest::Error) -> Self {
    let body = if err.is_timeout() {
      format!("request timed out: {}", err)
    } else {
      err.to_string()
    };
    Self::Remote {
      status: err.status().map(|s| s.as_u16()),
      body,
    }
  }
}
