//! The quality matrix: a weighted battery of heuristic checks applied to a
//! validated quiz before the orchestrator accepts it.
//!
//! Three criteria are critical (clarity, relevance, examiner standard): they
//! carry double weight and each must pass on its own. Thresholds and weights
//! live in `QualityConfig`; the defaults were tuned by inspection, not by
//! measurement, so they stay configurable.

use crate::config::QualityConfig;
use crate::domain::{
  CanonicalQuestion, GenerationRequest, QualityCheckResult, QualityReport, QuestionBody,
  QuestionType,
};
use crate::util::{clamp_score, unique_ratio, words};

const INFORMAL_WORDS: &[&str] = &[
  "gonna", "wanna", "gotta", "kinda", "sorta", "lol", "btw", "cool", "awesome", "dude", "stuff",
];
const INAPPROPRIATE_WORDS: &[&str] = &["stupid", "dumb", "idiot", "damn"];
const WHY_MARKERS: &[&str] = &["because", "why", "therefore", "so that", "since", "leads to"];
const PLACEHOLDER_MARKERS: &[&str] = &["todo", "lorem", "xxx", "n/a", "..."];

/// Score a validated quiz against the full criteria battery.
pub fn score_quiz(
  questions: &[CanonicalQuestion],
  req: &GenerationRequest,
  cfg: &QualityConfig,
) -> QualityReport {
  if questions.is_empty() {
    return QualityReport {
      checks: vec![],
      overall: 0.0,
      passed: false,
      needs_review: true,
    };
  }

  let checks = vec![
    clarity_check(questions, cfg),
    relevance_check(questions, req, cfg),
    examiner_check(questions, cfg),
    vocabulary_check(questions, cfg),
    variety_check(questions, req, cfg),
    educational_check(questions, cfg),
  ];

  let mut weighted_sum = 0.0;
  let mut weight_total = 0.0;
  for c in &checks {
    let w = if c.critical { cfg.critical_weight } else { 1.0 };
    weighted_sum += c.score * w;
    weight_total += w;
  }
  let overall = clamp_score(weighted_sum / weight_total);

  let criticals_pass = checks.iter().filter(|c| c.critical).all(|c| c.passed);
  let passed = overall >= cfg.pass_threshold && criticals_pass;

  let flagged_suggestion = checks.iter().any(|c| {
    c.suggestions
      .iter()
      .any(|s| {
        let s = s.to_lowercase();
        s.contains("grammar") || s.contains("inappropriate")
      })
  });
  let needs_review = (overall - cfg.pass_threshold).abs() <= cfg.review_margin
    || !criticals_pass
    || flagged_suggestion;

  QualityReport { checks, overall, passed, needs_review }
}

/// All text a question puts in front of the learner.
fn visible_text(q: &CanonicalQuestion) -> String {
  let mut parts = vec![q.text.clone()];
  match &q.body {
    QuestionBody::MultipleChoice { options, .. }
    | QuestionBody::TrueFalse { options, .. }
    | QuestionBody::Ordering { options, .. } => parts.extend(options.iter().cloned()),
    QuestionBody::Matching { pairs, .. } => {
      for p in pairs {
        parts.push(p.left.clone());
        parts.push(p.right.clone());
      }
    }
    QuestionBody::FillBlank { answer_text } | QuestionBody::Essay { answer_text } => {
      parts.push(answer_text.clone());
    }
  }
  parts.join(" ")
}

fn result(
  criterion: &str,
  critical: bool,
  score: f32,
  feedback: String,
  suggestions: Vec<String>,
  cfg: &QualityConfig,
) -> QualityCheckResult {
  let score = clamp_score(score);
  QualityCheckResult {
    criterion: criterion.into(),
    score,
    passed: score >= cfg.criterion_pass,
    critical,
    feedback,
    suggestions,
  }
}

/// Clarity & grammar signals: penalizes terse or shouty phrasing, rewards a
/// substantial explanation.
fn clarity_check(questions: &[CanonicalQuestion], cfg: &QualityConfig) -> QualityCheckResult {
  let mut total = 0.0;
  let mut suggestions = Vec::new();
  for (i, q) in questions.iter().enumerate() {
    let mut score: f32 = 100.0;
    let tokens = words(&q.text);
    if tokens.len() < 4 {
      score -= 35.0;
      suggestions.push(format!("Question {} is too short to be clear", i + 1));
    }
    if q.text.len() > 220 {
      score -= 15.0;
      suggestions.push(format!("Question {} reads as a run-on; split it up", i + 1));
    }
    if q.text.contains("??") || q.text.contains("!!") {
      score -= 20.0;
      suggestions.push(format!("Fix grammar and punctuation in question {}", i + 1));
    }
    if words(&q.explanation).len() >= 8 {
      score += 5.0;
    }
    total += clamp_score(score);
  }
  let avg = total / questions.len() as f32;
  result(
    "clarity",
    true,
    avg,
    format!("Average phrasing clarity across {} questions", questions.len()),
    suggestions,
    cfg,
  )
}

/// Topic overlap: every question should mention the requested topic or
/// subject somewhere the learner can see. Informal slang only subtracts.
fn relevance_check(
  questions: &[CanonicalQuestion],
  req: &GenerationRequest,
  cfg: &QualityConfig,
) -> QualityCheckResult {
  let mut topic_tokens = words(&req.topic);
  topic_tokens.extend(words(&req.subject));

  let mut on_topic = 0usize;
  let mut informal_hits = 0usize;
  let mut suggestions = Vec::new();
  for (i, q) in questions.iter().enumerate() {
    let text = format!("{} {}", visible_text(q), q.explanation);
    let tokens = words(&text);
    if topic_tokens.iter().any(|t| tokens.contains(t)) {
      on_topic += 1;
    } else {
      suggestions.push(format!("Tie question {} back to the topic \"{}\"", i + 1, req.topic));
    }
    informal_hits += tokens.iter().filter(|t| INFORMAL_WORDS.contains(&t.as_str())).count();
  }

  let base = 100.0 * on_topic as f32 / questions.len() as f32;
  let score = base - 8.0 * informal_hits as f32;
  if informal_hits > 0 {
    suggestions.push("Replace informal wording with an examiner-standard register".into());
  }
  result(
    "relevance",
    true,
    score,
    format!("{}/{} questions overlap the requested topic", on_topic, questions.len()),
    suggestions,
    cfg,
  )
}

/// Format authenticity per question type: the conventions an examiner would
/// expect (distinct options, statements for true/false, a blank to fill).
fn examiner_check(questions: &[CanonicalQuestion], cfg: &QualityConfig) -> QualityCheckResult {
  let mut total = 0.0;
  let mut suggestions = Vec::new();
  for (i, q) in questions.iter().enumerate() {
    let mut score: f32 = 100.0;
    let lowered = visible_text(q).to_lowercase();

    if PLACEHOLDER_MARKERS.iter().any(|m| lowered.contains(m)) {
      score -= 40.0;
      suggestions.push(format!("Replace placeholder content in question {}", i + 1));
    }
    for w in INAPPROPRIATE_WORDS {
      if words(&lowered).iter().any(|t| t == w) {
        score -= 30.0;
        suggestions.push(format!("Remove inappropriate language in question {}", i + 1));
      }
    }

    match &q.body {
      QuestionBody::MultipleChoice { options, .. } => {
        let mut seen: Vec<String> = Vec::new();
        for o in options {
          let key = o.trim().to_lowercase();
          if seen.contains(&key) {
            score -= 30.0;
            suggestions.push(format!("Question {} repeats an option", i + 1));
          } else {
            seen.push(key);
          }
        }
        if options.iter().any(|o| o.trim().is_empty()) {
          score -= 20.0;
        }
        if !q.text.trim_end().ends_with('?') && !q.text.contains("____") {
          score -= 10.0;
        }
      }
      QuestionBody::TrueFalse { .. } => {
        // true/false items are statements to judge, not questions
        if q.text.trim_end().ends_with('?') {
          score -= 10.0;
          suggestions.push(format!("Phrase question {} as a statement", i + 1));
        }
      }
      QuestionBody::FillBlank { .. } => {
        if !q.text.contains("___") {
          score -= 15.0;
          suggestions.push(format!("Question {} needs a visible blank", i + 1));
        }
      }
      QuestionBody::Essay { .. } | QuestionBody::Matching { .. } | QuestionBody::Ordering { .. } => {}
    }
    total += clamp_score(score);
  }
  let avg = total / questions.len() as f32;
  result(
    "examiner_standard",
    true,
    avg,
    "Question-format conventions per type".into(),
    suggestions,
    cfg,
  )
}

/// Vocabulary sophistication: average word length and lexical variety,
/// with slang subtracting.
fn vocabulary_check(questions: &[CanonicalQuestion], cfg: &QualityConfig) -> QualityCheckResult {
  let mut tokens: Vec<String> = Vec::new();
  for q in questions {
    tokens.extend(words(&visible_text(q)));
  }
  if tokens.is_empty() {
    return result("vocabulary", false, 0.0, "No visible text to assess".into(), vec![], cfg);
  }

  let avg_len = tokens.iter().map(|t| t.chars().count()).sum::<usize>() as f32 / tokens.len() as f32;
  let length_bonus = ((avg_len - 3.0) * 10.0).clamp(0.0, 20.0);
  let variety_bonus = (unique_ratio(&tokens) * 20.0).min(20.0);
  let informal = tokens.iter().filter(|t| INFORMAL_WORDS.contains(&t.as_str())).count();

  let score = 50.0 + length_bonus + variety_bonus + 10.0 - 10.0 * informal as f32;
  let mut suggestions = Vec::new();
  if informal > 0 {
    suggestions.push("Swap casual vocabulary for precise terms".into());
  }
  result(
    "vocabulary",
    false,
    score,
    format!("Average token length {:.1}, {} tokens", avg_len, tokens.len()),
    suggestions,
    cfg,
  )
}

/// Structural variety: distinct sentence openers and coverage of the
/// requested question types.
fn variety_check(
  questions: &[CanonicalQuestion],
  req: &GenerationRequest,
  cfg: &QualityConfig,
) -> QualityCheckResult {
  let mut openers: Vec<String> = Vec::new();
  let mut kinds: Vec<QuestionType> = Vec::new();
  for q in questions {
    let opener = words(&q.text).into_iter().take(2).collect::<Vec<_>>().join(" ");
    if !openers.contains(&opener) {
      openers.push(opener);
    }
    let kind = q.body.kind();
    if !kinds.contains(&kind) {
      kinds.push(kind);
    }
  }
  let opener_variety = openers.len() as f32 / questions.len() as f32;
  let type_coverage = kinds.len() as f32 / req.question_types.len() as f32;
  let score = 50.0 + opener_variety * 30.0 + type_coverage.min(1.0) * 20.0;
  let mut suggestions = Vec::new();
  if opener_variety < 0.6 && questions.len() > 2 {
    suggestions.push("Vary how questions begin; several share the same opener".into());
  }
  result(
    "structure_variety",
    false,
    score,
    format!("{} distinct openers, {} question types", openers.len(), kinds.len()),
    suggestions,
    cfg,
  )
}

/// Pedagogical value: does the explanation actually teach the WHY?
/// Detecting a why-marker can only add to the score.
fn educational_check(questions: &[CanonicalQuestion], cfg: &QualityConfig) -> QualityCheckResult {
  let mut total = 0.0;
  let mut suggestions = Vec::new();
  for (i, q) in questions.iter().enumerate() {
    let explanation = q.explanation.to_lowercase();
    let mut score: f32 = if explanation.trim().is_empty() { 30.0 } else { 60.0 };
    if explanation.trim().is_empty() {
      suggestions.push(format!("Add an explanation to question {}", i + 1));
    }
    if WHY_MARKERS.iter().any(|m| explanation.contains(m)) {
      score += 25.0;
    } else if !explanation.trim().is_empty() {
      suggestions.push(format!("Explain WHY the answer to question {} is correct", i + 1));
    }
    if words(&explanation).len() >= 12 {
      score += 15.0;
    }
    total += clamp_score(score);
  }
  let avg = total / questions.len() as f32;
  result(
    "educational_value",
    false,
    avg,
    "Explanations should teach, not just restate the answer".into(),
    suggestions,
    cfg,
  )
}
