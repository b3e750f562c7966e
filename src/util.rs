//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Normalize a submitted value by removing all whitespace.
/// Option values are compared in this form so `"(1, 2)"` matches `"(1,2)"`.
pub fn normalize(s: &str) -> String {
  s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_replaces_every_key() {
    let out = fill_template("Compute {a} + {b} = ?", &[("a", "586"), ("b", "479")]);
    assert_eq!(out, "Compute 586 + 479 = ?");
  }

  #[test]
  fn normalize_strips_spacing() {
    assert_eq!(normalize(" (2.33, 1.33) "), "(2.33,1.33)");
  }
}
