use serde_json::Value;
use std::collections::HashSet;

/// Trim every candidate, drop blanks and duplicates, keep first-seen order
pub fn dedup_trimmed<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut values = Vec::new();

    for candidate in candidates {
        let trimmed = candidate.as_ref().trim();
        if trimmed.is_empty() || seen.contains(trimmed) {
            continue;
        }
        seen.insert(trimmed.to_string());
        values.push(trimmed.to_string());
    }

    values
}

/// Truncate a string to at most `max_bytes`, backing off to a char boundary
pub fn truncate_to_bytes(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }

    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

/// Count ASCII letters and digits
pub fn alphanumeric_len(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_alphanumeric()).count()
}

/// Strings as-is, other JSON values in their JSON form
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_trimmed() {
        let values = dedup_trimmed([" Hello ", "", "Hello", "  ", "World", "Hello\n"]);
        assert_eq!(values, vec!["Hello", "World"]);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let mut text = "héllo".to_string();
        truncate_to_bytes(&mut text, 2);
        assert_eq!(text, "h");

        let mut short = "abc".to_string();
        truncate_to_bytes(&mut short, 10);
        assert_eq!(short, "abc");
    }

    #[test]
    fn test_alphanumeric_len() {
        assert_eq!(alphanumeric_len("© 2024!"), 4);
        assert_eq!(alphanumeric_len("   "), 0);
    }
}
