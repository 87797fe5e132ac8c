use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: String,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self {
      role: "system".to_string(),
      content: content.into(),
    }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role: "user".to_string(),
      content: content.into(),
    }
  }
}

/// One chat-style completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
  pub model: String,
  pub messages: Vec<ChatMessage>,
  pub temperature: f32,
  pub max_tokens: u32,
}

/// A text model that answers a chat request with a single reply.
#[async_trait]
pub trait RatingOracle: Send + Sync {
  async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
  usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
  total_tokens: u64,
}

/// OpenAI chat completions endpoint
pub struct OpenAiOracle {
  http: Client,
  base_url: String,
  api_key: String,
}

impl OpenAiOracle {
  pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
    Ok(Self {
      http: http::build_client(timeout)?,
      base_url: base_url.trim_end_matches('/').to_string(),
      api_key,
    })
  }
}

#[async_trait]
impl RatingOracle for OpenAiOracle {
  async fn complete(&self, request: &ChatRequest) -> Result<String> {
    let response = self
      .http
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(&self.api_key)
      .json(request)
      .send()
      .await?;
    let reply: ChatResponse = http::json(response).await?;

    if let Some(usage) = &reply.usage {
      debug!(tokens = usage.total_tokens, model = %request.model, "tokens used");
    }

    reply
      .choices
      .into_iter()
      .next()
      .filter(|c| c.message.role == "assistant")
      .map(|c| c.message.content)
      .ok_or_else(|| Error::Remote {
        status: None,
        body: "completion returned no assistant message".to_string(),
      })
  }
}
