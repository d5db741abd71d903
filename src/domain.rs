//! Domain models used by the backend: generation requests, canonical quizzes,
//! questions with their typed answer keys, and generation outcomes.

use serde::{Deserialize, Serialize};

/// Difficulty levels accepted by the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Advanced,
}
impl Default for Difficulty {
  fn default() -> Self { Difficulty::Beginner }
}

impl Difficulty {
  pub fn label(&self) -> &'static str {
    match self {
      Difficulty::Beginner => "beginner",
      Difficulty::Intermediate => "intermediate",
      Difficulty::Advanced => "advanced",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "beginner" | "easy" => Some(Difficulty::Beginner),
      "intermediate" | "medium" => Some(Difficulty::Intermediate),
      "advanced" | "hard" => Some(Difficulty::Advanced),
      _ => None,
    }
  }
}

/// The fixed set of question types the pipeline knows how to validate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  MultipleChoice,
  TrueFalse,
  FillBlank,
  Essay,
  Matching,
  Ordering,
}

impl QuestionType {
  pub fn label(&self) -> &'static str {
    match self {
      QuestionType::MultipleChoice => "multiple_choice",
      QuestionType::TrueFalse => "true_false",
      QuestionType::FillBlank => "fill_blank",
      QuestionType::Essay => "essay",
      QuestionType::Matching => "matching",
      QuestionType::Ordering => "ordering",
    }
  }

  /// Parse the labels models actually emit, including a few common aliases.
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().replace('-', "_").as_str() {
      "multiple_choice" | "multiplechoice" | "mcq" => Some(QuestionType::MultipleChoice),
      "true_false" | "truefalse" | "boolean" => Some(QuestionType::TrueFalse),
      "fill_blank" | "fill_in_the_blank" | "fillblank" => Some(QuestionType::FillBlank),
      "essay" | "open_ended" => Some(QuestionType::Essay),
      "matching" => Some(QuestionType::Matching),
      "ordering" | "sequence" => Some(QuestionType::Ordering),
      _ => None,
    }
  }
}

/// Bounds on how many questions one request may ask for.
pub const MIN_QUESTIONS: u32 = 2;
pub const MAX_QUESTIONS: u32 = 25;

/// Immutable description of what the caller wants generated.
/// Built once per request; the pipeline never mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
  pub topic: String,
  pub subject: String,
  pub question_count: u32,
  pub difficulty: Difficulty,
  pub question_types: Vec<QuestionType>,
  /// Language the question text should be written in.
  pub question_language: String,
  /// Language explanations should be written in (may differ from the above).
  pub explanation_language: String,
}

impl GenerationRequest {
  /// Validate and clamp caller input. Topic and at least one question type
  /// are required; the count is clamped into [MIN_QUESTIONS, MAX_QUESTIONS].
  pub fn new(
    topic: &str,
    subject: &str,
    question_count: u32,
    difficulty: Difficulty,
    question_types: Vec<QuestionType>,
    question_language: &str,
    explanation_language: &str,
  ) -> Result<Self, String> {
    let topic = topic.trim();
    if topic.is_empty() {
      return Err("topic must not be empty".into());
    }
    if question_types.is_empty() {
      return Err("at least one question type is required".into());
    }
    let mut types = Vec::new();
    for t in question_types {
      if !types.contains(&t) { types.push(t); }
    }
    let q_lang = question_language.trim();
    let e_lang = explanation_language.trim();
    Ok(Self {
      topic: topic.to_string(),
      subject: subject.trim().to_string(),
      question_count: question_count.clamp(MIN_QUESTIONS, MAX_QUESTIONS),
      difficulty,
      question_types: types,
      question_language: if q_lang.is_empty() { "English".into() } else { q_lang.to_string() },
      explanation_language: if e_lang.is_empty() { "English".into() } else { e_lang.to_string() },
    })
  }
}

/// One left/right pair of a matching question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
  pub left: String,
  pub right: String,
}

/// Type-specific payload of a question. The tag decides the answer shape,
/// so a validated question can never carry an ambiguous answer key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum QuestionBody {
  MultipleChoice { options: Vec<String>, answer: usize },
  TrueFalse { options: Vec<String>, answer: usize },
  FillBlank { answer_text: String },
  Essay { answer_text: String },
  Matching { pairs: Vec<MatchPair>, answer: Vec<usize> },
  Ordering { options: Vec<String>, answer: Vec<usize> },
}

impl QuestionBody {
  pub fn kind(&self) -> QuestionType {
    match self {
      QuestionBody::MultipleChoice { .. } => QuestionType::MultipleChoice,
      QuestionBody::TrueFalse { .. } => QuestionType::TrueFalse,
      QuestionBody::FillBlank { .. } => QuestionType::FillBlank,
      QuestionBody::Essay { .. } => QuestionType::Essay,
      QuestionBody::Matching { .. } => QuestionType::Matching,
      QuestionBody::Ordering { .. } => QuestionType::Ordering,
    }
  }
}

/// A fully validated question inside a canonical quiz.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CanonicalQuestion {
  pub text: String,
  #[serde(flatten)]
  pub body: QuestionBody,
  #[serde(default)]
  pub explanation: String,
  #[serde(default)]
  pub points: Option<u32>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub difficulty: Option<Difficulty>,
}

/// The single normalized quiz representation, independent of whichever
/// shape the model returned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CanonicalQuiz {
  pub id: String,
  #[serde(default)]
  pub source: QuizSource,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub category: String,
  pub difficulty: Difficulty,
  /// Rough solve time in minutes, derived when the model omits it.
  pub duration_minutes: u32,
  pub questions: Vec<CanonicalQuestion>,
}

/// Where a served quiz came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizSource {
  Generated,
  SeedBank,
  HardFallback,
}
impl Default for QuizSource {
  fn default() -> Self { QuizSource::Generated }
}

/// Outcome of a single quality criterion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QualityCheckResult {
  pub criterion: String,
  pub score: f32,
  pub passed: bool,
  pub critical: bool,
  pub feedback: String,
  #[serde(default)]
  pub suggestions: Vec<String>,
}

/// Aggregated quality verdict over a whole quiz.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QualityReport {
  pub checks: Vec<QualityCheckResult>,
  pub overall: f32,
  pub passed: bool,
  pub needs_review: bool,
}

/// Which pipeline stage an attempt died in. Reported in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
  Provider,
  Truncated,
  JsonRecovery,
  Shape,
  Validation,
  Quality,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttemptFailure {
  pub attempt: u32,
  pub stage: FailureStage,
  pub detail: String,
}

/// Per-request diagnostic trail surfaced to the caller alongside the result.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Diagnostics {
  pub attempts: u32,
  pub best_score: f32,
  pub needs_review: bool,
  #[serde(default)]
  pub warnings: Vec<String>,
  #[serde(default)]
  pub failures: Vec<AttemptFailure>,
}

/// Structured result of a generation call. Total failure is expressed here,
/// never as a panic or an error bubbling into the host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOutcome {
  pub success: bool,
  pub quiz: Option<CanonicalQuiz>,
  pub error: Option<String>,
  pub diagnostics: Diagnostics,
}
