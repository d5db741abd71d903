//! Loading generator configuration (prompt templates + quality/retry tuning)
//! from TOML.
//!
//! Every field has a default, so the service runs with no config file at all.
//! See `GenConfig` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct GenConfig {
  pub prompts: PromptConfig,
  pub quality: QualityConfig,
  pub retry: RetryPolicy,
}

/// Prompt templates used by the prompt builder. Placeholders in `{braces}`
/// are filled from the generation request; see `prompt::build_prompts`.
/// Override them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
  pub system_template: String,
  pub content_template: String,
  /// Prepended to the system prompt from the second attempt onward.
  pub strict_preamble: String,
}

impl Default for PromptConfig {
  fn default() -> Self {
    Self {
      system_template: "You are an expert quiz author for an online learning platform. \
You write {difficulty}-level educational quizzes. \
Question text must be written in {question_language}. \
Explanations must be written in {explanation_language}. \
Respond ONLY with a single JSON object, no prose and no markdown.".into(),
      content_template: "Create a quiz about \"{topic}\" (subject: {subject}).\n\
Requirements:\n\
- EXACTLY {count} questions.\n\
- Allowed question types: {types}. Do NOT use any other type.\n\
- Difficulty: {difficulty}.\n\
- Question text in {question_language}; every explanation in {explanation_language}.\n\
- Every question needs an explanation saying WHY the answer is correct.\n\n\
Return JSON of this shape:\n{format_example}".into(),
      strict_preamble: "STRICT MODE: Output must be one valid JSON object and nothing else. \
No markdown fences, no commentary, no trailing commas. \
Produce EXACTLY the requested number of questions, using ONLY the allowed question types. ".into(),
    }
  }
}

/// Quality-matrix tuning. Thresholds are heuristic defaults, deliberately
/// overridable since they were tuned by inspection rather than measurement.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
  /// Overall score required for a clean pass.
  pub pass_threshold: f32,
  /// Lower "good enough" bar the orchestrator may accept with a review flag.
  pub accept_threshold: f32,
  /// Scores within this margin of the pass threshold get flagged for review.
  pub review_margin: f32,
  /// Per-criterion pass bar.
  pub criterion_pass: f32,
  /// Weight multiplier for critical criteria in the overall mean.
  pub critical_weight: f32,
}

impl Default for QualityConfig {
  fn default() -> Self {
    Self {
      pass_threshold: 75.0,
      accept_threshold: 65.0,
      review_margin: 10.0,
      criterion_pass: 70.0,
      critical_weight: 2.0,
    }
  }
}

/// Attempt budget and per-attempt escalation of the retry orchestrator.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub initial_max_tokens: u32,
  /// Added to the token ceiling on every retry (and after truncation).
  pub token_step: u32,
  pub initial_temperature: f32,
  /// Subtracted from the temperature on every retry.
  pub temperature_step: f32,
  pub min_temperature: f32,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      initial_max_tokens: 3000,
      token_step: 1500,
      initial_temperature: 0.7,
      temperature_step: 0.25,
      min_temperature: 0.1,
    }
  }
}

impl RetryPolicy {
  /// Token ceiling for a given 1-based attempt number.
  pub fn max_tokens_for(&self, attempt: u32) -> u32 {
    self.initial_max_tokens + self.token_step * attempt.saturating_sub(1)
  }

  /// Temperature for a given 1-based attempt number.
  pub fn temperature_for(&self, attempt: u32) -> f32 {
    let t = self.initial_temperature - self.temperature_step * attempt.saturating_sub(1) as f32;
    t.max(self.min_temperature)
  }
}

/// Attempt to load `GenConfig` from GEN_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_gen_config_from_env() -> Option<GenConfig> {
  let path = std::env::var("GEN_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<GenConfig>(&s) {
      Ok(cfg) => {
        info!(target: "quizsmith_backend", %path, "Loaded generator config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizsmith_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizsmith_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn retry_escalation_raises_tokens_and_cools_temperature() {
    let p = RetryPolicy::default();
    assert_eq!(p.max_tokens_for(1), 3000);
    assert_eq!(p.max_tokens_for(3), 6000);
    assert!(p.temperature_for(2) < p.temperature_for(1));
    assert!(p.temperature_for(10) >= p.min_temperature);
  }

  #[test]
  fn config_parses_partial_toml() {
    let cfg: GenConfig = toml::from_str(
      r#"
      [quality]
      pass_threshold = 80.0

      [retry]
      max_attempts = 2
      "#,
    )
    .expect("partial config");
    assert_eq!(cfg.quality.pass_threshold, 80.0);
    assert_eq!(cfg.retry.max_attempts, 2);
    // untouched sections keep defaults
    assert_eq!(cfg.retry.initial_max_tokens, 3000);
    assert!(!cfg.prompts.system_template.is_empty());
  }
}
