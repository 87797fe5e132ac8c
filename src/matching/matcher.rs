use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::oracle::{ChatMessage, ChatRequest, RatingOracle};

static SCORE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").expect("score pattern"));

const SYSTEM_PROMPT: &str = "You are a helpful assistant. Please rate the match between search \
  parameters and options from 1 to 100. Only respond with a number.";

#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
  pub model: String,
  /// Candidates rated per oracle call
  pub batch_size: usize,
  pub temperature: f32,
  pub max_tokens: u32,
}

impl Default for MatcherConfig {
  fn default() -> Self {
    Self {
      model: "gpt-4".to_string(),
      batch_size: 3,
      temperature: 0.7,
      max_tokens: 50,
    }
  }
}

/// Picks the candidate an oracle rates closest to a query.
pub struct Matcher<O: RatingOracle> {
  oracle: O,
  config: MatcherConfig,
}

impl<O: RatingOracle> Matcher<O> {
  pub fn new(oracle: O, config: MatcherConfig) -> Self {
    Self { oracle, config }
  }

  fn request(&self, query: &str, batch: &[String]) -> ChatRequest {
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
    messages.extend(batch.iter().map(|candidate| {
      ChatMessage::user(format!(
        "Rate the match between '{}' and '{}' from 1 to 100.",
        query, candidate
      ))
    }));

    ChatRequest {
      model: self.config.model.clone(),
      messages,
      temperature: self.config.temperature,
      max_tokens: self.config.max_tokens,
    }
  }

  /// Score every candidate, in input order.
  ///
  /// Line `j` of a reply scores candidate `j` of its batch; a missing or
  /// unreadable line leaves that score empty. `None` if any oracle call fails.
  pub async fn scores(&self, query: &str, candidates: &[String]) -> Option<Vec<Option<f64>>> {
    let batch_size = self.config.batch_size.max(1);
    let mut scores = Vec::with_capacity(candidates.len());

    for batch in candidates.chunks(batch_size) {
      let reply = match self.oracle.complete(&self.request(query, batch)).await {
        Ok(reply) => reply,
        Err(e) => {
          warn!(error = %e, "rating request failed");
          return None;
        }
      };

      let mut lines = reply.lines();
      for candidate in batch {
        let score = lines.next().and_then(parse_score);
        debug!(candidate = %candidate, ?score, "candidate rated");
        scores.push(score);
      }
    }

    Some(scores)
  }

  /// The candidate with the highest score, first one on ties.
  ///
  /// `None` when there are no candidates, the oracle fails, or no reply
  /// line could be read as a score.
  pub async fn best_match(&self, query: &str, candidates: &[String]) -> Option<String> {
    if candidates.is_empty() {
      return None;
    }

    let scores = self.scores(query, candidates).await?;
    if scores.iter().all(Option::is_none) {
      return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (index, score) in scores.iter().enumerate() {
      let score = score.unwrap_or(0.0);
      if best.map_or(true, |(_, top)| score > top) {
        best = Some((index, score));
      }
    }

    best.map(|(index, _)| candidates[index].clone())
  }
}

fn parse_score(line: &str) -> Option<f64> {
  SCORE
    .find(line)
    .and_then(|m| m.as_str().parse::<f64>().ok())
}
