//! Minimal OpenAI-style completion client for quiz generation.
//!
//! We only call chat.completions and always request a strict JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes
//! (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::util::trunc_for_log;

/// One completion invocation: prompt pair plus sampling limits.
#[derive(Clone, Debug)]
pub struct CompletionCall {
  pub system: String,
  pub prompt: String,
  pub max_tokens: u32,
  pub temperature: f32,
}

/// Raw result of a single model invocation attempt.
/// `truncated` means the provider cut the output at its length limit; the
/// response still counts as successful transport-wise, but downstream layers
/// treat it as a soft failure.
#[derive(Clone, Debug)]
pub struct RawModelResponse {
  pub success: bool,
  pub text: String,
  pub truncated: bool,
  pub error: Option<String>,
}

impl RawModelResponse {
  pub fn ok(text: String, truncated: bool) -> Self {
    Self { success: true, text, truncated, error: None }
  }

  pub fn failed(msg: impl Into<String>) -> Self {
    Self { success: false, text: String::new(), truncated: false, error: Some(msg.into()) }
  }
}

/// The single external seam of the pipeline. Implementations must not panic;
/// every failure mode is folded into `RawModelResponse`.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
  async fn complete(&self, call: &CompletionCall) -> RawModelResponse;
}

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let timeout_secs = std::env::var("GEN_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .unwrap_or(30);

    // The HTTP timeout bounds the only suspension point of the pipeline;
    // an expired timer aborts the in-flight call.
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }
}

#[async_trait]
impl CompletionBackend for OpenAI {
  #[instrument(level = "info", skip(self, call),
               fields(model = %self.model, max_tokens = call.max_tokens, temperature = call.temperature))]
  async fn complete(&self, call: &CompletionCall) -> RawModelResponse {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: call.system.clone() },
        ChatMessageReq { role: "user".into(), content: call.prompt.clone() },
      ],
      temperature: call.temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: Some(call.max_tokens),
    };

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "quizsmith-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await;

    let res = match res {
      Ok(r) => r,
      Err(e) if e.is_timeout() => {
        error!(target: "quizgen", elapsed = ?start.elapsed(), "Model call timed out");
        return RawModelResponse::failed("model call timed out");
      }
      Err(e) => {
        error!(target: "quizgen", error = %e, "Model call transport failure");
        return RawModelResponse::failed(format!("transport error: {e}"));
      }
    };

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return RawModelResponse::failed(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = match res.json().await {
      Ok(b) => b,
      Err(e) => return RawModelResponse::failed(format!("malformed provider response: {e}")),
    };
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }

    let choice = match body.choices.into_iter().next() {
      Some(c) => c,
      None => return RawModelResponse::failed("provider returned no choices"),
    };
    let truncated = matches!(choice.finish_reason.as_deref(), Some("length") | Some("MAX_TOKENS"));
    let text = choice.message.content.unwrap_or_default().trim().to_string();
    if text.is_empty() {
      return RawModelResponse::failed("model returned empty content");
    }

    info!(target: "quizgen", elapsed = ?start.elapsed(), bytes = text.len(), truncated, "Model response received");
    RawModelResponse::ok(text, truncated)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
