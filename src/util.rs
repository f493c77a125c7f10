// form field <-> db column helpers.

/// Collapse blank form input to `None`.
pub fn none_if_blank(val: Option<String>) -> Option<String> {
  match val {
    Some(s) => {
      let trimmed = s.trim();
      if trimmed.is_empty() {
        None
      } else if trimmed.len() == s.len() {
        Some(s)
      } else {
        Some(trimmed.to_string())
      }
    },
    None => None,
  }
}

/// Blank or missing input falls back to the given default.
pub fn or_default(val: Option<String>, default: &str) -> String {
  none_if_blank(val).unwrap_or_else(|| default.to_string())
}
