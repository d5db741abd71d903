//! JSON recovery: digging a parseable JSON document out of raw model output.
//!
//! Flow:
//! 1) Strip markdown code fences.
//! 2) Slice from the first `{` (or `[`) to the last matching closer; if the
//!    closer never arrived, cut the `questions` array after its last complete
//!    object and close it ourselves.
//! 3) Textual repairs: trailing commas, missing commas between adjacent
//!    objects/arrays, unbalanced delimiters, an unterminated trailing string.
//! 4) Parse. Errors carry the character offset for diagnostics.
//!
//! Nothing here panics; the caller gets `Err` only when no candidate exists
//! or every repair still fails to parse.

use serde_json::Value;
use tracing::debug;

/// Extract and parse a JSON document from raw model text.
pub fn recover_json(raw: &str) -> Result<Value, String> {
  let stripped = strip_code_fences(raw);

  // A payload that *starts* with `[` is the bare-array shape; otherwise the
  // outermost `{` wins even when prose containing brackets precedes it.
  let bare_array = stripped.trim_start().starts_with('[');
  let (start, open) = if bare_array {
    (stripped.find('[').unwrap_or(0), '[')
  } else if let Some(o) = stripped.find('{') {
    (o, '{')
  } else {
    return Err("no JSON object found in model output".into());
  };
  let tail = &stripped[start..];

  let close = if open == '{' { '}' } else { ']' };
  let candidate = match tail.rfind(close) {
    Some(end) => tail[..=end].to_string(),
    None => truncated_questions_repair(tail).unwrap_or_else(|| tail.to_string()),
  };

  let repaired = apply_text_repairs(&candidate);
  match serde_json::from_str::<Value>(&repaired) {
    Ok(v) => Ok(v),
    Err(first_err) => {
      // The closer we sliced to may belong to an incomplete trailing
      // question; retry as a truncated questions array.
      if let Some(cut) = truncated_questions_repair(tail) {
        let repaired = apply_text_repairs(&cut);
        if let Ok(v) = serde_json::from_str::<Value>(&repaired) {
          debug!(target: "quizgen", "Recovered JSON via truncation repair");
          return Ok(v);
        }
      }
      let offset = offset_of(&repaired, first_err.line(), first_err.column());
      Err(format!("JSON parse failed at offset {}: {}", offset, first_err))
    }
  }
}

/// All textual repairs, in order.
fn apply_text_repairs(s: &str) -> String {
  let s = remove_trailing_commas(s);
  let s = insert_missing_commas(&s);
  close_open_delimiters(&s)
}

/// Drop markdown fence markers, keeping whatever they wrapped.
fn strip_code_fences(raw: &str) -> String {
  raw
    .lines()
    .filter(|line| !line.trim_start().starts_with("```"))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Tiny string-aware scanner state shared by the repair passes.
struct Scan {
  in_string: bool,
  escaped: bool,
}

impl Scan {
  fn new() -> Self {
    Self { in_string: false, escaped: false }
  }

  /// Feed one char; returns true while inside a string literal.
  fn step(&mut self, ch: char) -> bool {
    if self.in_string {
      if self.escaped {
        self.escaped = false;
      } else if ch == '\\' {
        self.escaped = true;
      } else if ch == '"' {
        self.in_string = false;
      }
      true
    } else {
      if ch == '"' {
        self.in_string = true;
      }
      false
    }
  }
}

/// Remove commas that directly precede a closing `}` or `]`.
fn remove_trailing_commas(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut scan = Scan::new();
  let chars: Vec<char> = s.chars().collect();
  let mut i = 0;
  while i < chars.len() {
    let ch = chars[i];
    let in_string = scan.step(ch);
    if !in_string && ch == ',' {
      let mut j = i + 1;
      while j < chars.len() && chars[j].is_whitespace() { j += 1; }
      if j < chars.len() && (chars[j] == '}' || chars[j] == ']') {
        i += 1; // drop the comma, keep the whitespace
        continue;
      }
    }
    out.push(ch);
    i += 1;
  }
  out
}

/// Insert the comma the model forgot between adjacent `}{` or `][`.
fn insert_missing_commas(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + 8);
  let mut scan = Scan::new();
  let chars: Vec<char> = s.chars().collect();
  for (i, &ch) in chars.iter().enumerate() {
    let in_string = scan.step(ch);
    out.push(ch);
    if in_string || (ch != '}' && ch != ']') {
      continue;
    }
    let mut j = i + 1;
    while j < chars.len() && chars[j].is_whitespace() { j += 1; }
    if j < chars.len()
      && ((ch == '}' && chars[j] == '{') || (ch == ']' && chars[j] == '['))
    {
      out.push(',');
    }
  }
  out
}

/// Close an unterminated trailing string, then append the deficit of
/// closing brackets/braces in proper nesting order.
fn close_open_delimiters(s: &str) -> String {
  let mut stack: Vec<char> = Vec::new();
  let mut scan = Scan::new();
  for ch in s.chars() {
    if scan.step(ch) {
      continue;
    }
    match ch {
      '{' => stack.push('}'),
      '[' => stack.push(']'),
      '}' | ']' => {
        if stack.last() == Some(&ch) {
          stack.pop();
        }
      }
      _ => {}
    }
  }

  if stack.is_empty() && !scan.in_string {
    return s.to_string();
  }

  let mut out = s.to_string();
  if scan.in_string {
    if scan.escaped {
      out.pop(); // a lone trailing backslash would escape our quote
    }
    out.push('"');
  }
  // a trailing comma before the synthesized closers would re-break the parse
  while out.ends_with(|c: char| c.is_whitespace() || c == ',') {
    out.pop();
  }
  while let Some(c) = stack.pop() {
    out.push(c);
  }
  out
}

/// Truncation repair for output cut inside the `questions` array: keep every
/// syntactically complete question object and close the array + document.
/// Returns None when the text has no `questions` array or the array closed
/// normally (nothing to repair).
fn truncated_questions_repair(s: &str) -> Option<String> {
  let key = s.find("\"questions\"")?;
  let arr_open = key + s[key..].find('[')?;

  let mut depth: i32 = 0;
  let mut scan = Scan::new();
  let mut last_complete: Option<usize> = None;
  for (i, ch) in s[arr_open + 1..].char_indices() {
    let abs = arr_open + 1 + i;
    if scan.step(ch) {
      continue;
    }
    match ch {
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          last_complete = Some(abs);
        }
      }
      ']' if depth <= 0 => return None,
      _ => {}
    }
  }

  let end = last_complete?;
  Some(format!("{}]}}", &s[..=end]))
}

/// Byte offset of a 1-based line/column position, for parse diagnostics.
fn offset_of(s: &str, line: usize, column: usize) -> usize {
  let mut offset = 0usize;
  for (n, l) in s.lines().enumerate() {
    if n + 1 == line {
      return offset + column.saturating_sub(1);
    }
    offset += l.len() + 1;
  }
  offset + column.saturating_sub(1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn strips_markdown_fences() {
    let raw = "Here is your quiz:\n```json\n{\"title\": \"T\", \"questions\": []}\n```";
    let v = recover_json(raw).expect("parse");
    assert_eq!(v["title"], "T");
  }

  #[test]
  fn trailing_comma_repair_round_trips() {
    let original = json!({"title": "T", "questions": [{"q": 1}, {"q": 2}]});
    let broken = "{\"title\": \"T\", \"questions\": [{\"q\": 1}, {\"q\": 2},],}";
    let v = recover_json(broken).expect("parse");
    assert_eq!(v, original);
  }

  #[test]
  fn inserts_comma_between_adjacent_objects() {
    let broken = r#"{"questions": [{"q": 1} {"q": 2}]}"#;
    let v = recover_json(broken).expect("parse");
    assert_eq!(v["questions"].as_array().unwrap().len(), 2);
  }

  #[test]
  fn balances_missing_closers() {
    let broken = r#"{"title": "T", "tags": ["a", "b""#;
    let v = recover_json(broken).expect("parse");
    assert_eq!(v["tags"], json!(["a", "b"]));
  }

  #[test]
  fn closes_unterminated_trailing_string() {
    let broken = r#"{"title": "Photosyn"#;
    let v = recover_json(broken).expect("parse");
    assert_eq!(v["title"], "Photosyn");
  }

  #[test]
  fn truncation_keeps_only_complete_questions() {
    let broken = r#"{"quiz_title": "Plants", "questions": [
      {"question": "Q1?", "question_type": "true_false", "options": ["True", "False"], "correct_answer": 0},
      {"question": "Q2?", "question_type": "true_false", "options": ["True", "False"], "correct_answer": 1},
      {"question": "Q3?", "question_type": "multiple_cho"#;
    let v = recover_json(broken).expect("parse");
    let qs = v["questions"].as_array().expect("array");
    assert_eq!(qs.len(), 2);
    assert_eq!(qs[1]["question"], "Q2?");
  }

  #[test]
  fn braces_inside_strings_are_not_structure() {
    let raw = r#"{"title": "set {a} and [b]", "questions": []}"#;
    let v = recover_json(raw).expect("parse");
    assert_eq!(v["title"], "set {a} and [b]");
  }

  #[test]
  fn bare_array_is_accepted() {
    let raw = r#"[{"question": "Q?", "question_type": "essay"}]"#;
    let v = recover_json(raw).expect("parse");
    assert!(v.is_array());
  }

  #[test]
  fn no_braces_is_an_error() {
    let err = recover_json("Sorry, I cannot help with that.").unwrap_err();
    assert!(err.contains("no JSON object"));
  }

  #[test]
  fn unrecoverable_garbage_reports_offset() {
    let err = recover_json("{:::not json at all:::}").unwrap_err();
    assert!(err.contains("offset"), "got: {err}");
  }
}
