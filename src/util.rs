//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Lowercased word tokens, alphanumerics only.
/// The quality checks compare token sets, not raw substrings.
pub fn words(s: &str) -> Vec<String> {
  s.split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .map(|w| w.to_lowercase())
    .collect()
}

/// Share of distinct tokens in a token list. 1.0 for an empty list.
pub fn unique_ratio(tokens: &[String]) -> f32 {
  if tokens.is_empty() { return 1.0; }
  let mut seen: Vec<&str> = Vec::with_capacity(tokens.len());
  for t in tokens {
    if !seen.contains(&t.as_str()) { seen.push(t); }
  }
  seen.len() as f32 / tokens.len() as f32
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    s.to_string()
  } else {
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) { end -= 1; }
    format!("{}… ({} bytes total)", &s[..end], s.len())
  }
}

/// Clamp a score into the 0..=100 band.
pub fn clamp_score(v: f32) -> f32 {
  v.clamp(0.0, 100.0)
}
