//! Prompt builder: turns a `GenerationRequest` into the (system, content)
//! prompt pair sent to the model.
//!
//! The builder is pure and infallible. Templates come from config (with
//! defaults); a strictness knob tightens the wording for retry attempts.

use crate::config::PromptConfig;
use crate::domain::{GenerationRequest, QuestionType};
use crate::util::fill_template;

/// Worked example emitted into the prompt for each allowed question type.
/// Keeping these as plain JSON keeps the prompt and the normalizer honest
/// about the field names we expect back.
pub fn example_question_json(t: QuestionType) -> &'static str {
  match t {
    QuestionType::MultipleChoice => r#"{"question": "What gas do plants absorb during photosynthesis?", "question_type": "multiple_choice", "options": ["Oxygen", "Carbon dioxide", "Nitrogen", "Hydrogen"], "correct_answer": 1, "explanation": "Plants take in carbon dioxide because it supplies the carbon atoms used to build glucose."}"#,
    QuestionType::TrueFalse => r#"{"question": "Photosynthesis releases oxygen as a by-product.", "question_type": "true_false", "options": ["True", "False"], "correct_answer": 0, "explanation": "True, because splitting water molecules during the light reactions frees oxygen."}"#,
    QuestionType::FillBlank => r#"{"question": "The green pigment that captures light energy is called ____.", "question_type": "fill_blank", "correct_answer_text": "chlorophyll", "explanation": "Chlorophyll absorbs red and blue light, which is why leaves look green."}"#,
    QuestionType::Essay => r#"{"question": "Explain why photosynthesis matters for most life on Earth.", "question_type": "essay", "correct_answer_text": "Key points: converts light energy into chemical energy, produces oxygen, forms the base of most food chains.", "explanation": "A strong answer links the energy conversion to both the oxygen supply and food webs."}"#,
    QuestionType::Matching => r#"{"question": "Match each plant structure to its role in photosynthesis.", "question_type": "matching", "options": [{"left": "Chloroplast", "right": "Site of photosynthesis"}, {"left": "Stomata", "right": "Gas exchange"}], "correct_answer": [0, 1], "explanation": "Chloroplasts host the reactions because they contain chlorophyll; stomata open to let gases in and out."}"#,
    QuestionType::Ordering => r#"{"question": "Put the stages of photosynthesis in order.", "question_type": "ordering", "options": ["Light absorption", "Water splitting", "Glucose synthesis"], "correct_answer": [0, 1, 2], "explanation": "Light must be captured first because its energy drives the later stages."}"#,
  }
}

fn types_list(types: &[QuestionType]) -> String {
  types.iter().map(|t| t.label()).collect::<Vec<_>>().join(", ")
}

/// JSON skeleton with one worked example per allowed type.
fn format_example(types: &[QuestionType]) -> String {
  let examples = types
    .iter()
    .map(|t| format!("    {}", example_question_json(*t)))
    .collect::<Vec<_>>()
    .join(",\n");
  format!(
    "{{\n  \"quiz_title\": \"...\",\n  \"quiz_description\": \"...\",\n  \"questions\": [\n{}\n  ]\n}}",
    examples
  )
}

/// Build the (system, content) prompt pair. `strict` is set by the
/// orchestrator from the second attempt onward.
pub fn build_prompts(req: &GenerationRequest, cfg: &PromptConfig, strict: bool) -> (String, String) {
  let count = req.question_count.to_string();
  let types = types_list(&req.question_types);

  let mut system = fill_template(
    &cfg.system_template,
    &[
      ("difficulty", req.difficulty.label()),
      ("question_language", &req.question_language),
      ("explanation_language", &req.explanation_language),
    ],
  );
  if strict {
    system = format!("{}{}", cfg.strict_preamble, system);
  }

  let content = fill_template(
    &cfg.content_template,
    &[
      ("topic", &req.topic),
      ("subject", &req.subject),
      ("count", &count),
      ("difficulty", req.difficulty.label()),
      ("types", &types),
      ("question_language", &req.question_language),
      ("explanation_language", &req.explanation_language),
      ("format_example", &format_example(&req.question_types)),
    ],
  );

  (system, content)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;

  fn req() -> GenerationRequest {
    GenerationRequest::new(
      "Photosynthesis",
      "Science",
      4,
      Difficulty::Beginner,
      vec![QuestionType::MultipleChoice, QuestionType::TrueFalse],
      "English",
      "Khmer",
    )
    .expect("request")
  }

  #[test]
  fn content_embeds_count_types_and_difficulty() {
    let (_, content) = build_prompts(&req(), &PromptConfig::default(), false);
    assert!(content.contains("EXACTLY 4 questions"));
    assert!(content.contains("multiple_choice, true_false"));
    assert!(content.contains("Do NOT use any other type"));
    assert!(content.contains("beginner"));
    assert!(content.contains("Photosynthesis"));
  }

  #[test]
  fn languages_for_questions_and_explanations_can_differ() {
    let (system, content) = build_prompts(&req(), &PromptConfig::default(), false);
    assert!(system.contains("Question text must be written in English"));
    assert!(system.contains("Explanations must be written in Khmer"));
    assert!(content.contains("Question text in English"));
    assert!(content.contains("explanation in Khmer"));
  }

  #[test]
  fn strict_mode_prepends_preamble() {
    let cfg = PromptConfig::default();
    let (relaxed, _) = build_prompts(&req(), &cfg, false);
    let (strict, _) = build_prompts(&req(), &cfg, true);
    assert!(!relaxed.starts_with("STRICT MODE"));
    assert!(strict.starts_with("STRICT MODE"));
    assert!(strict.ends_with(relaxed.as_str()));
  }

  #[test]
  fn format_example_covers_only_allowed_types() {
    let (_, content) = build_prompts(&req(), &PromptConfig::default(), false);
    assert!(content.contains("What gas do plants absorb"));
    assert!(content.contains("releases oxygen as a by-product"));
    assert!(!content.contains("fill_blank"));
    assert!(!content.contains("matching"));
  }
}
