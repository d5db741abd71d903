//! Structural normalizer: maps the several top-level shapes models actually
//! return into one draft quiz shape, and resolves per-question field aliases.
//!
//! Recognized shapes, in priority order:
//!   `{quiz_title, quiz_description, questions}`
//!   `{quiz: [...]}`
//!   `{title, questions}`
//!   `{questions}`
//!   bare array of questions
//! Anything else is unrecoverable and yields None.

use serde_json::Value;

use crate::domain::{Difficulty, GenerationRequest};

/// Quiz shape between normalization and validation. Field types are still
/// loose; the per-type validator turns drafts into canonical questions.
#[derive(Clone, Debug)]
pub struct DraftQuiz {
  pub title: String,
  pub description: String,
  pub category: String,
  pub duration_minutes: Option<u32>,
  pub questions: Vec<DraftQuestion>,
}

#[derive(Clone, Debug, Default)]
pub struct DraftQuestion {
  pub text: String,
  pub type_label: String,
  pub options: Vec<Value>,
  pub answer: Option<Value>,
  pub answer_text: Option<String>,
  pub explanation: String,
  pub points: Option<u32>,
  pub tags: Vec<String>,
  pub difficulty: Option<String>,
}

fn str_field(obj: &Value, keys: &[&str]) -> Option<String> {
  for k in keys {
    if let Some(s) = obj.get(*k).and_then(Value::as_str) {
      let s = s.trim();
      if !s.is_empty() {
        return Some(s.to_string());
      }
    }
  }
  None
}

fn normalize_question(v: &Value) -> DraftQuestion {
  let text = str_field(v, &["question", "question_text", "text"]).unwrap_or_default();
  let type_label = str_field(v, &["question_type", "type"]).unwrap_or_default();
  let options = v
    .get("options")
    .and_then(Value::as_array)
    .cloned()
    .unwrap_or_default();
  let answer = v.get("correct_answer").cloned().filter(|a| !a.is_null());
  let answer_text = str_field(v, &["correct_answer_text", "answer_text"]);
  let explanation = str_field(v, &["explanation"]).unwrap_or_default();
  let points = v.get("points").and_then(Value::as_u64).map(|p| p as u32);
  let tags = v
    .get("tags")
    .and_then(Value::as_array)
    .map(|a| {
      a.iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
    })
    .unwrap_or_default();
  let difficulty = str_field(v, &["difficulty"]);

  DraftQuestion {
    text,
    type_label,
    options,
    answer,
    answer_text,
    explanation,
    points,
    tags,
    difficulty,
  }
}

/// Map a parsed JSON document of unknown shape into a draft quiz.
/// Returns None when the shape is unrecognizable.
pub fn normalize_quiz(v: &Value, req: &GenerationRequest) -> Option<DraftQuiz> {
  let fallback_title = format!("{} Quiz", req.topic);
  let fallback_description =
    format!("A {} quiz about {}.", req.difficulty.label(), req.topic);

  let (title, description, questions_value) = match v {
    Value::Object(map) => {
      if map.contains_key("quiz_title") {
        (
          str_field(v, &["quiz_title"]).unwrap_or(fallback_title),
          str_field(v, &["quiz_description"]).unwrap_or(fallback_description),
          v.get("questions")?,
        )
      } else if let Some(quiz) = map.get("quiz") {
        if !quiz.is_array() {
          return None;
        }
        (fallback_title, fallback_description, quiz)
      } else if map.contains_key("title") {
        (
          str_field(v, &["title"]).unwrap_or(fallback_title),
          str_field(v, &["description"]).unwrap_or(fallback_description),
          v.get("questions")?,
        )
      } else if map.contains_key("questions") {
        (fallback_title, fallback_description, v.get("questions")?)
      } else {
        return None;
      }
    }
    Value::Array(_) => (fallback_title, fallback_description, v),
    _ => return None,
  };

  let questions = questions_value.as_array()?;
  let category = str_field(v, &["category"]).unwrap_or_else(|| req.subject.clone());
  let duration_minutes = v
    .get("duration_minutes")
    .or_else(|| v.get("duration"))
    .and_then(Value::as_u64)
    .map(|d| d as u32);

  Some(DraftQuiz {
    title,
    description,
    category,
    duration_minutes,
    questions: questions.iter().map(normalize_question).collect(),
  })
}

/// Rough solve-time estimate used when the model omits a duration.
pub fn default_duration(question_count: usize, difficulty: Difficulty) -> u32 {
  let per_question = match difficulty {
    Difficulty::Beginner => 1,
    Difficulty::Intermediate => 2,
    Difficulty::Advanced => 3,
  };
  (question_count as u32 * per_question).max(1)
}
