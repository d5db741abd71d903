//! Retry orchestrator: drives prompt → model → recovery → normalize →
//! validate → score for up to `RetryPolicy::max_attempts` attempts.
//!
//! Escalation per attempt: stricter prompt wording (from attempt 2), lower
//! temperature, higher token ceiling. A truncated or unparseable response
//! moves straight to the next attempt without scoring. On exhaustion the
//! caller gets the best validated quiz we saw (marked unsuccessful) or a
//! structured failure; never a panic, never a partially valid quiz.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::GenConfig;
use crate::domain::{
  AttemptFailure, CanonicalQuiz, Diagnostics, FailureStage, GenerationOutcome, GenerationRequest,
  QualityReport,
};
use crate::normalize::{self, DraftQuiz};
use crate::openai::{CompletionBackend, CompletionCall};
use crate::prompt::build_prompts;
use crate::quality::score_quiz;
use crate::recovery::recover_json;
use crate::validate::validate_quiz;

pub struct QuizGenerator {
  backend: Arc<dyn CompletionBackend>,
  cfg: GenConfig,
}

impl QuizGenerator {
  pub fn new(backend: Arc<dyn CompletionBackend>, cfg: GenConfig) -> Self {
    Self { backend, cfg }
  }

  /// Run the full generation pipeline for one request.
  #[instrument(level = "info", skip(self, req),
               fields(topic = %req.topic, count = req.question_count, difficulty = %req.difficulty.label()))]
  pub async fn generate(&self, req: &GenerationRequest) -> GenerationOutcome {
    let policy = self.cfg.retry.clone();
    let mut diag = Diagnostics::default();
    let mut best: Option<(CanonicalQuiz, QualityReport)> = None;
    let mut last_failure = String::from("no attempts made");
    // raised beyond the per-attempt schedule whenever the provider truncates
    let mut extra_tokens = 0u32;

    for attempt in 1..=policy.max_attempts.max(1) {
      diag.attempts = attempt;
      let mut fail = |stage: FailureStage, detail: String, diag: &mut Diagnostics| {
        warn!(target: "quizgen", attempt, ?stage, detail = %detail, "Generation attempt failed");
        last_failure = detail.clone();
        diag.failures.push(AttemptFailure { attempt, stage, detail });
      };

      let (system, content) = build_prompts(req, &self.cfg.prompts, attempt > 1);
      let call = CompletionCall {
        system,
        prompt: content,
        max_tokens: policy.max_tokens_for(attempt) + extra_tokens,
        temperature: policy.temperature_for(attempt),
      };
      let resp = self.backend.complete(&call).await;

      if !resp.success {
        let detail = resp.error.unwrap_or_else(|| "provider failure".into());
        fail(FailureStage::Provider, detail, &mut diag);
        continue;
      }
      if resp.truncated {
        extra_tokens += policy.token_step;
        fail(
          FailureStage::Truncated,
          format!("output cut at {} tokens; raising the ceiling", call.max_tokens),
          &mut diag,
        );
        continue;
      }

      let value = match recover_json(&resp.text) {
        Ok(v) => v,
        Err(e) => {
          fail(FailureStage::JsonRecovery, e, &mut diag);
          continue;
        }
      };
      let draft = match normalize::normalize_quiz(&value, req) {
        Some(d) => d,
        None => {
          fail(FailureStage::Shape, "unrecognized top-level quiz shape".into(), &mut diag);
          continue;
        }
      };
      let questions = match validate_quiz(&draft) {
        Ok(q) => q,
        Err(e) => {
          fail(FailureStage::Validation, e, &mut diag);
          continue;
        }
      };
      if questions.len() != req.question_count as usize {
        diag.warnings.push(format!(
          "requested {} questions, model produced {}",
          req.question_count,
          questions.len()
        ));
      }

      let report = score_quiz(&questions, req, &self.cfg.quality);
      diag.best_score = diag.best_score.max(report.overall);
      let quiz = assemble_quiz(req, &draft, questions);

      if report.passed || report.overall >= self.cfg.quality.accept_threshold {
        diag.needs_review = report.needs_review;
        info!(target: "quizgen", attempt, score = %format!("{:.1}", report.overall),
              questions = quiz.questions.len(), needs_review = report.needs_review,
              "Quiz accepted");
        return GenerationOutcome {
          success: true,
          quiz: Some(quiz),
          error: None,
          diagnostics: diag,
        };
      }

      let failing: Vec<&str> = report
        .checks
        .iter()
        .filter(|c| !c.passed)
        .map(|c| c.criterion.as_str())
        .collect();
      fail(
        FailureStage::Quality,
        format!(
          "quality score {:.1} below threshold (failing: {})",
          report.overall,
          failing.join(", ")
        ),
        &mut diag,
      );
      if best.as_ref().map_or(true, |(_, r)| report.overall > r.overall) {
        best = Some((quiz, report));
      }
    }

    // Attempt budget exhausted. Surface the best validated quiz we have as an
    // explicitly unsuccessful, review-needing result; otherwise a plain failure.
    diag.needs_review = true;
    match best {
      Some((quiz, report)) => GenerationOutcome {
        success: false,
        quiz: Some(quiz),
        error: Some(format!(
          "quality stayed below threshold after {} attempts (best score {:.1}); last failure: {}",
          diag.attempts, report.overall, last_failure
        )),
        diagnostics: diag,
      },
      None => GenerationOutcome {
        success: false,
        quiz: None,
        error: Some(format!(
          "quiz generation failed after {} attempts (best score {:.1}); last failure: {}",
          diag.attempts, diag.best_score, last_failure
        )),
        diagnostics: diag,
      },
    }
  }
}

fn assemble_quiz(
  req: &GenerationRequest,
  draft: &DraftQuiz,
  questions: Vec<crate::domain::CanonicalQuestion>,
) -> CanonicalQuiz {
  let duration = draft
    .duration_minutes
    .unwrap_or_else(|| normalize::default_duration(questions.len(), req.difficulty));
  CanonicalQuiz {
    id: Uuid::new_v4().to_string(),
    source: crate::domain::QuizSource::Generated,
    title: draft.title.clone(),
    description: draft.description.clone(),
    category: draft.category.clone(),
    difficulty: req.difficulty,
    duration_minutes: duration,
    questions,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Difficulty, QuestionType};
  use crate::openai::RawModelResponse;
  use crate::prompt::example_question_json;
  use async_trait::async_trait;
  use std::collections::VecDeque;
  use std::sync::Mutex;

  /// Scripted backend: pops one canned response per call and records the
  /// calls it saw, so tests can assert on the escalation schedule.
  struct FakeBackend {
    responses: Mutex<VecDeque<RawModelResponse>>,
    calls: Mutex<Vec<CompletionCall>>,
  }

  impl FakeBackend {
    fn new(responses: Vec<RawModelResponse>) -> Self {
      Self {
        responses: Mutex::new(responses.into()),
        calls: Mutex::new(Vec::new()),
      }
    }

    fn calls(&self) -> Vec<CompletionCall> {
      self.calls.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl CompletionBackend for FakeBackend {
    async fn complete(&self, call: &CompletionCall) -> RawModelResponse {
      self.calls.lock().unwrap().push(call.clone());
      self
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| RawModelResponse::failed("script exhausted"))
    }
  }

  fn request(count: u32, types: Vec<QuestionType>) -> GenerationRequest {
    GenerationRequest::new(
      "Photosynthesis",
      "Science",
      count,
      Difficulty::Beginner,
      types,
      "English",
      "English",
    )
    .expect("request")
  }

  fn generator(backend: Arc<FakeBackend>) -> QuizGenerator {
    QuizGenerator::new(backend, GenConfig::default())
  }

  fn two_question_payload() -> String {
    format!(
      r#"{{"quiz_title": "Photosynthesis Basics", "quiz_description": "Two quick checks.", "questions": [{}, {}]}}"#,
      example_question_json(QuestionType::MultipleChoice),
      example_question_json(QuestionType::TrueFalse),
    )
  }

  fn tf_question_json(i: usize) -> String {
    format!(
      r#"{{"question": "Photosynthesis claim {i}: plants convert light energy into chemical energy stored in glucose.", "question_type": "true_false", "options": ["True", "False"], "correct_answer": 0, "explanation": "True, because the light reactions capture energy that the Calvin cycle then locks into sugar molecules."}}"#
    )
  }

  #[tokio::test]
  async fn happy_path_returns_a_two_question_quiz() {
    let backend = Arc::new(FakeBackend::new(vec![RawModelResponse::ok(
      two_question_payload(),
      false,
    )]));
    let outcome = generator(backend.clone())
      .generate(&request(2, vec![QuestionType::MultipleChoice, QuestionType::TrueFalse]))
      .await;

    assert!(outcome.success, "error: {:?}", outcome.error);
    let quiz = outcome.quiz.expect("quiz");
    assert_eq!(quiz.questions.len(), 2);
    assert_eq!(quiz.difficulty, Difficulty::Beginner);
    assert_eq!(quiz.title, "Photosynthesis Basics");
    assert_eq!(outcome.diagnostics.attempts, 1);
    assert!(outcome.diagnostics.warnings.is_empty());
    assert_eq!(backend.calls().len(), 1);
  }

  #[tokio::test]
  async fn truncated_attempt_is_discarded_and_retried_with_a_higher_ceiling() {
    let questions: Vec<String> = (1..=5).map(tf_question_json).collect();
    let full = format!(r#"{{"quiz_title": "Light", "questions": [{}]}}"#, questions.join(", "));
    // fragment cut off inside the third question
    let fragment = full[..full.len() * 2 / 5].to_string();

    let backend = Arc::new(FakeBackend::new(vec![
      RawModelResponse::ok(fragment, true),
      RawModelResponse::ok(full, false),
    ]));
    let outcome = generator(backend.clone())
      .generate(&request(5, vec![QuestionType::TrueFalse]))
      .await;

    assert!(outcome.success, "error: {:?}", outcome.error);
    assert_eq!(outcome.quiz.expect("quiz").questions.len(), 5);
    assert_eq!(outcome.diagnostics.failures.len(), 1);
    assert_eq!(outcome.diagnostics.failures[0].stage, FailureStage::Truncated);

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].max_tokens > calls[0].max_tokens);
  }

  #[tokio::test]
  async fn quiz_array_variant_is_titled_from_the_topic() {
    let payload = format!(r#"{{"quiz": [{}]}}"#, tf_question_json(1));
    let backend = Arc::new(FakeBackend::new(vec![RawModelResponse::ok(payload, false)]));
    let outcome = generator(backend)
      .generate(&request(2, vec![QuestionType::TrueFalse]))
      .await;

    assert!(outcome.success, "error: {:?}", outcome.error);
    let quiz = outcome.quiz.expect("quiz");
    assert_eq!(quiz.title, "Photosynthesis Quiz");
    assert_eq!(quiz.questions.len(), 1);
    // one question against a request for two: warned about, not fatal
    assert!(!outcome.diagnostics.warnings.is_empty());
  }

  #[tokio::test]
  async fn second_attempt_uses_a_stricter_prompt_and_cooler_temperature() {
    let backend = Arc::new(FakeBackend::new(vec![
      RawModelResponse::ok("Sorry, I can only answer questions about cooking.".into(), false),
      RawModelResponse::ok(two_question_payload(), false),
    ]));
    let outcome = generator(backend.clone())
      .generate(&request(2, vec![QuestionType::MultipleChoice, QuestionType::TrueFalse]))
      .await;

    assert!(outcome.success);
    assert_eq!(outcome.diagnostics.failures[0].stage, FailureStage::JsonRecovery);

    let calls = backend.calls();
    assert!(!calls[0].system.starts_with("STRICT MODE"));
    assert!(calls[1].system.starts_with("STRICT MODE"));
    assert!(calls[1].temperature < calls[0].temperature);
  }

  #[tokio::test]
  async fn exhausted_attempts_return_a_structured_failure() {
    let backend = Arc::new(FakeBackend::new(vec![
      RawModelResponse::failed("connection reset"),
      RawModelResponse::failed("connection reset"),
      RawModelResponse::failed("connection reset"),
    ]));
    let outcome = generator(backend)
      .generate(&request(3, vec![QuestionType::Essay]))
      .await;

    assert!(!outcome.success);
    assert!(outcome.quiz.is_none());
    assert_eq!(outcome.diagnostics.attempts, 3);
    assert_eq!(outcome.diagnostics.failures.len(), 3);
    let err = outcome.error.expect("error");
    assert!(err.contains("connection reset"));
    assert!(err.contains("3 attempts"));
  }

  #[tokio::test]
  async fn low_quality_output_is_retried_and_surfaced_as_best_effort() {
    // Valid structure, hopeless content: off-topic, terse, no explanations.
    let junk = r#"{"questions": [
      {"question": "Huh??", "question_type": "multiple_choice", "options": ["A", "B"], "correct_answer": 0},
      {"question": "What??", "question_type": "multiple_choice", "options": ["C", "D"], "correct_answer": 1}
    ]}"#;
    let backend = Arc::new(FakeBackend::new(vec![
      RawModelResponse::ok(junk.into(), false),
      RawModelResponse::ok(junk.into(), false),
      RawModelResponse::ok(junk.into(), false),
    ]));
    let outcome = generator(backend)
      .generate(&request(2, vec![QuestionType::MultipleChoice]))
      .await;

    assert!(!outcome.success);
    // best validated attempt still comes back, flagged for review
    assert!(outcome.quiz.is_some());
    assert!(outcome.diagnostics.needs_review);
    assert!(outcome.diagnostics.best_score > 0.0);
    assert!(outcome
      .diagnostics
      .failures
      .iter()
      .all(|f| f.stage == FailureStage::Quality));
    assert!(outcome.error.expect("error").contains("best score"));
  }
}
