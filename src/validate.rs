//! Per-type validation: enforces each question type's required fields and
//! value constraints, applying safe defaults only where a defect is clearly
//! mechanical (true/false label order, stringly-typed answer indices).
//!
//! One bad question invalidates the whole quiz; the pipeline never serves a
//! partially valid quiz.

use serde_json::Value;

use crate::domain::{CanonicalQuestion, Difficulty, MatchPair, QuestionBody, QuestionType};
use crate::normalize::{DraftQuestion, DraftQuiz};

/// Validate every question of a draft; first violation rejects the quiz.
pub fn validate_quiz(draft: &DraftQuiz) -> Result<Vec<CanonicalQuestion>, String> {
  draft
    .questions
    .iter()
    .enumerate()
    .map(|(i, q)| validate_question(q, i))
    .collect()
}

/// Validate one draft question. `index` is only used for error messages.
pub fn validate_question(d: &DraftQuestion, index: usize) -> Result<CanonicalQuestion, String> {
  let text = d.text.trim().to_string();
  if text.is_empty() {
    return Err(format!("question {}: missing question text", index + 1));
  }
  let kind = QuestionType::parse(&d.type_label)
    .ok_or_else(|| format!("question {}: unknown question type '{}'", index + 1, d.type_label))?;

  let body = match kind {
    QuestionType::MultipleChoice => {
      let options = text_options(d, index)?;
      if options.len() < 2 {
        return Err(format!(
          "question {}: multiple_choice needs at least 2 options, got {}",
          index + 1,
          options.len()
        ));
      }
      let answer = answer_index(d, index)?;
      if answer >= options.len() {
        return Err(format!(
          "question {}: correct_answer {} out of range for {} options",
          index + 1,
          answer,
          options.len()
        ));
      }
      QuestionBody::MultipleChoice { options, answer }
    }
    QuestionType::TrueFalse => {
      let options = text_options(d, index)?;
      if options.len() != 2 {
        return Err(format!(
          "question {}: true_false needs exactly 2 options, got {}",
          index + 1,
          options.len()
        ));
      }
      let answer = answer_index(d, index)?;
      if answer > 1 {
        return Err(format!("question {}: true_false answer must be 0 or 1", index + 1));
      }
      let lowered: Vec<String> = options.iter().map(|o| o.trim().to_lowercase()).collect();
      let mut labels = lowered.clone();
      labels.sort();
      if labels != ["false", "true"] {
        return Err(format!(
          "question {}: true_false options must be the True/False labels",
          index + 1
        ));
      }
      // Canonical label set is ["True", "False"]; remap the answer when the
      // model emitted them in the other order.
      let answer = if lowered[answer] == "true" { 0 } else { 1 };
      QuestionBody::TrueFalse { options: vec!["True".into(), "False".into()], answer }
    }
    QuestionType::FillBlank | QuestionType::Essay => {
      let answer_text = d
        .answer_text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
          format!("question {}: {} needs a correct_answer_text", index + 1, kind.label())
        })?
        .to_string();
      if kind == QuestionType::FillBlank {
        QuestionBody::FillBlank { answer_text }
      } else {
        QuestionBody::Essay { answer_text }
      }
    }
    QuestionType::Matching => {
      let pairs = match_pairs(d, index)?;
      if pairs.len() < 2 {
        return Err(format!(
          "question {}: matching needs at least 2 pairs, got {}",
          index + 1,
          pairs.len()
        ));
      }
      // A missing answer defaults to the identity mapping, since the pairs
      // themselves already encode the correct association.
      let answer = match &d.answer {
        None => (0..pairs.len()).collect(),
        Some(v) => index_array(v, pairs.len(), index)?,
      };
      QuestionBody::Matching { pairs, answer }
    }
    QuestionType::Ordering => {
      let options = text_options(d, index)?;
      if options.len() < 2 {
        return Err(format!(
          "question {}: ordering needs at least 2 options, got {}",
          index + 1,
          options.len()
        ));
      }
      let answer_value = d
        .answer
        .as_ref()
        .ok_or_else(|| format!("question {}: ordering needs a correct_answer array", index + 1))?;
      let answer = index_array(answer_value, options.len(), index)?;
      if answer.is_empty() {
        return Err(format!("question {}: ordering answer must not be empty", index + 1));
      }
      QuestionBody::Ordering { options, answer }
    }
  };

  Ok(CanonicalQuestion {
    text,
    body,
    explanation: d.explanation.trim().to_string(),
    points: d.points,
    tags: d.tags.clone(),
    difficulty: d.difficulty.as_deref().and_then(Difficulty::parse),
  })
}

fn text_options(d: &DraftQuestion, index: usize) -> Result<Vec<String>, String> {
  d.options
    .iter()
    .map(|v| {
      v.as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| format!("question {}: options must be text", index + 1))
    })
    .collect()
}

/// Answer index, accepting a JSON number or a numeric string.
fn answer_index(d: &DraftQuestion, index: usize) -> Result<usize, String> {
  let v = d
    .answer
    .as_ref()
    .ok_or_else(|| format!("question {}: missing correct_answer", index + 1))?;
  match v {
    Value::Number(n) => n
      .as_u64()
      .map(|n| n as usize)
      .ok_or_else(|| format!("question {}: correct_answer must be a non-negative integer", index + 1)),
    Value::String(s) => s
      .trim()
      .parse::<usize>()
      .map_err(|_| format!("question {}: correct_answer must be an integer index", index + 1)),
    _ => Err(format!("question {}: correct_answer must be an integer index", index + 1)),
  }
}

fn index_array(v: &Value, len: usize, index: usize) -> Result<Vec<usize>, String> {
  let arr = v
    .as_array()
    .ok_or_else(|| format!("question {}: correct_answer must be an array", index + 1))?;
  let mut out = Vec::with_capacity(arr.len());
  for item in arr {
    let n = item
      .as_u64()
      .ok_or_else(|| format!("question {}: correct_answer entries must be integers", index + 1))?
      as usize;
    if n >= len {
      return Err(format!(
        "question {}: correct_answer index {} out of range ({} entries)",
        index + 1,
        n,
        len
      ));
    }
    out.push(n);
  }
  Ok(out)
}

fn match_pairs(d: &DraftQuestion, index: usize) -> Result<Vec<MatchPair>, String> {
  d.options
    .iter()
    .map(|v| {
      let left = v.get("left").and_then(Value::as_str);
      let right = v.get("right").and_then(Value::as_str);
      match (left, right) {
        (Some(l), Some(r)) if !l.trim().is_empty() && !r.trim().is_empty() => Ok(MatchPair {
          left: l.trim().to_string(),
          right: r.trim().to_string(),
        }),
        _ => Err(format!(
          "question {}: matching options must be {{left, right}} pairs",
          index + 1
        )),
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn draft(text: &str, type_label: &str) -> DraftQuestion {
    DraftQuestion {
      text: text.into(),
      type_label: type_label.into(),
      ..Default::default()
    }
  }

  #[test]
  fn accepts_a_valid_multiple_choice_question() {
    let mut d = draft("What gas do plants absorb?", "multiple_choice");
    d.options = vec![json!("Oxygen"), json!("Carbon dioxide"), json!("Nitrogen")];
    d.answer = Some(json!(1));
    let q = validate_question(&d, 0).expect("valid");
    assert_eq!(
      q.body,
      QuestionBody::MultipleChoice {
        options: vec!["Oxygen".into(), "Carbon dioxide".into(), "Nitrogen".into()],
        answer: 1
      }
    );
  }

  #[test]
  fn rejects_multiple_choice_with_one_option() {
    let mut d = draft("Q?", "multiple_choice");
    d.options = vec![json!("Only")];
    d.answer = Some(json!(0));
    let err = validate_question(&d, 0).unwrap_err();
    assert!(err.contains("at least 2 options"));
  }

  #[test]
  fn rejects_out_of_range_answer_index() {
    let mut d = draft("Q?", "multiple_choice");
    d.options = vec![json!("A"), json!("B")];
    d.answer = Some(json!(5));
    assert!(validate_question(&d, 0).unwrap_err().contains("out of range"));
  }

  #[test]
  fn accepts_numeric_string_answer_index() {
    let mut d = draft("Q?", "multiple_choice");
    d.options = vec![json!("A"), json!("B")];
    d.answer = Some(json!("1"));
    let q = validate_question(&d, 0).expect("valid");
    assert!(matches!(q.body, QuestionBody::MultipleChoice { answer: 1, .. }));
  }

  #[test]
  fn true_false_label_order_is_fixed_and_answer_remapped() {
    let mut d = draft("Water boils at 100C at sea level.", "true_false");
    d.options = vec![json!("false"), json!("true")];
    d.answer = Some(json!(1)); // points at "true"
    let q = validate_question(&d, 0).expect("valid");
    assert_eq!(
      q.body,
      QuestionBody::TrueFalse { options: vec!["True".into(), "False".into()], answer: 0 }
    );
  }

  #[test]
  fn true_false_rejects_wrong_option_count_or_labels() {
    let mut d = draft("Q?", "true_false");
    d.options = vec![json!("True"), json!("False"), json!("Maybe")];
    d.answer = Some(json!(0));
    assert!(validate_question(&d, 0).unwrap_err().contains("exactly 2"));

    let mut d = draft("Q?", "true_false");
    d.options = vec![json!("Yes"), json!("No")];
    d.answer = Some(json!(0));
    assert!(validate_question(&d, 0).unwrap_err().contains("labels"));
  }

  #[test]
  fn fill_blank_requires_answer_text() {
    let d = draft("The pigment is ____.", "fill_blank");
    assert!(validate_question(&d, 0).unwrap_err().contains("correct_answer_text"));

    let mut d = draft("The pigment is ____.", "fill_blank");
    d.answer_text = Some("chlorophyll".into());
    let q = validate_question(&d, 0).expect("valid");
    assert_eq!(q.body, QuestionBody::FillBlank { answer_text: "chlorophyll".into() });
  }

  #[test]
  fn matching_needs_left_right_pairs() {
    let mut d = draft("Match them.", "matching");
    d.options = vec![json!({"left": "A", "right": "1"}), json!("not a pair")];
    assert!(validate_question(&d, 0).unwrap_err().contains("pairs"));
  }

  #[test]
  fn matching_defaults_missing_answer_to_identity() {
    let mut d = draft("Match them.", "matching");
    d.options = vec![
      json!({"left": "Chloroplast", "right": "Photosynthesis"}),
      json!({"left": "Stomata", "right": "Gas exchange"}),
    ];
    let q = validate_question(&d, 0).expect("valid");
    assert!(matches!(q.body, QuestionBody::Matching { ref answer, .. } if *answer == vec![0, 1]));
  }

  #[test]
  fn ordering_validates_answer_indices() {
    let mut d = draft("Order the steps.", "ordering");
    d.options = vec![json!("First"), json!("Second"), json!("Third")];
    d.answer = Some(json!([2, 0, 1]));
    let q = validate_question(&d, 0).expect("valid");
    assert!(matches!(q.body, QuestionBody::Ordering { ref answer, .. } if *answer == vec![2, 0, 1]));

    let mut d = draft("Order the steps.", "ordering");
    d.options = vec![json!("First"), json!("Second")];
    d.answer = Some(json!([0, 7]));
    assert!(validate_question(&d, 0).unwrap_err().contains("out of range"));
  }

  #[test]
  fn unknown_question_type_rejects_the_question() {
    let d = draft("Q?", "crossword");
    assert!(validate_question(&d, 0).unwrap_err().contains("unknown question type"));
  }

  #[test]
  fn missing_text_rejects_the_question() {
    let d = draft("   ", "essay");
    assert!(validate_question(&d, 0).unwrap_err().contains("missing question text"));
  }
}
