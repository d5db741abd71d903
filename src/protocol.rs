//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{
    CanonicalQuiz, Diagnostics, Difficulty, GenerationRequest, QuestionType,
};

fn default_count() -> u32 {
    5
}

/// Body of `POST /api/v1/quiz/generate`. Field names accept both snake_case
/// and the camelCase a JS frontend tends to send.
#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    pub topic: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default = "default_count", alias = "questionCount")]
    pub question_count: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, alias = "questionTypes")]
    pub question_types: Vec<String>,
    #[serde(default, alias = "questionLanguage")]
    pub question_language: Option<String>,
    #[serde(default, alias = "explanationLanguage")]
    pub explanation_language: Option<String>,
}

impl GenerateIn {
    /// Convert the wire shape into a validated `GenerationRequest`.
    pub fn into_request(self) -> Result<GenerationRequest, String> {
        let difficulty = match self.difficulty.as_deref() {
            None | Some("") => Difficulty::Beginner,
            Some(s) => {
                Difficulty::parse(s).ok_or_else(|| format!("unknown difficulty '{}'", s))?
            }
        };
        let types = if self.question_types.is_empty() {
            vec![QuestionType::MultipleChoice, QuestionType::TrueFalse]
        } else {
            self.question_types
                .iter()
                .map(|s| {
                    QuestionType::parse(s).ok_or_else(|| format!("unknown question type '{}'", s))
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        GenerationRequest::new(
            &self.topic,
            &self.subject,
            self.question_count,
            difficulty,
            types,
            self.question_language.as_deref().unwrap_or(""),
            self.explanation_language.as_deref().unwrap_or(""),
        )
    }
}

/// Response of `POST /api/v1/quiz/generate`.
#[derive(Serialize)]
pub struct GenerateOut {
    pub success: bool,
    pub origin: String,
    pub quiz: Option<CanonicalQuiz>,
    pub error: Option<String>,
    pub diagnostics: Diagnostics,
}

impl GenerateOut {
    /// Outcome for caller input that never reached the pipeline.
    pub fn rejected(message: String) -> Self {
        Self {
            success: false,
            origin: "rejected".into(),
            quiz: None,
            error: Some(message),
            diagnostics: Diagnostics::default(),
        }
    }
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub model_enabled: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_aliases_are_accepted() {
        let body = r#"{
            "topic": "Photosynthesis",
            "subject": "Science",
            "questionCount": 4,
            "difficulty": "beginner",
            "questionTypes": ["multiple_choice", "true_false"],
            "explanationLanguage": "Khmer"
        }"#;
        let parsed: GenerateIn = serde_json::from_str(body).expect("deserialize");
        let req = parsed.into_request().expect("request");
        assert_eq!(req.question_count, 4);
        assert_eq!(req.question_types.len(), 2);
        assert_eq!(req.explanation_language, "Khmer");
        assert_eq!(req.question_language, "English");
    }

    #[test]
    fn unknown_enum_values_are_rejected_with_a_message() {
        let parsed: GenerateIn =
            serde_json::from_str(r#"{"topic": "T", "difficulty": "impossible"}"#).unwrap();
        assert!(parsed.into_request().unwrap_err().contains("unknown difficulty"));

        let parsed: GenerateIn =
            serde_json::from_str(r#"{"topic": "T", "question_types": ["crossword"]}"#).unwrap();
        assert!(parsed.into_request().unwrap_err().contains("unknown question type"));
    }

    #[test]
    fn defaults_fill_in_a_minimal_body() {
        let parsed: GenerateIn = serde_json::from_str(r#"{"topic": "Fractions"}"#).unwrap();
        let req = parsed.into_request().expect("request");
        assert_eq!(req.question_count, 5);
        assert_eq!(req.difficulty, Difficulty::Beginner);
        assert!(!req.question_types.is_empty());
    }
}
