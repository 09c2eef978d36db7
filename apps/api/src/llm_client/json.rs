//! Recovery of a JSON object from untrusted model output.
//!
//! Models wrap JSON in code fences, prepend "Here is the result:" or append notes.
//! `parse_json_object` strips fences, tries the cleaned text, then retries once on
//! the first balanced `{ ... }` substring.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Characters of raw output kept in errors and logs.
const EXCERPT_CHARS: usize = 500;

#[derive(Debug, Error)]
#[error("Malformed model output ({reason}): {excerpt}")]
pub struct MalformedOutput {
    pub reason: String,
    pub excerpt: String,
}

impl MalformedOutput {
    pub fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            excerpt: excerpt(raw, EXCERPT_CHARS),
        }
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().nth(max_chars).is_some() {
        out.push('…');
    }
    out
}

/// Strips ```json ... ``` or ``` ... ``` fences, wherever they sit in the text.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let body = if let Some(start) = text.find("```json") {
        &text[start + "```json".len()..]
    } else if let Some(start) = text.find("```") {
        &text[start + "```".len()..]
    } else {
        return text;
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Locates the first balanced `{ ... }` span, ignoring braces inside string literals.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses model output into a JSON object, tolerating fences and surrounding prose.
pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>, MalformedOutput> {
    let cleaned = strip_json_fences(raw);

    let value = match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => value,
        Err(first_err) => {
            let candidate = first_json_object(cleaned)
                .ok_or_else(|| MalformedOutput::new(format!("no JSON object: {first_err}"), raw))?;
            serde_json::from_str::<Value>(candidate)
                .map_err(|e| MalformedOutput::new(e.to_string(), raw))?
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(MalformedOutput::new(
            format!("expected a JSON object, got {}", json_kind(&other)),
            raw,
        )),
    }
}

/// `parse_json_object` followed by typed deserialization.
pub fn parse_json_as<T: DeserializeOwned>(raw: &str) -> Result<T, MalformedOutput> {
    let map = parse_json_object(raw)?;
    serde_json::from_value(Value::Object(map)).map_err(|e| MalformedOutput::new(e.to_string(), raw))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_after_leading_prose() {
        let input = "Sure! Here it is:\n```json\n{\"a\": 1}\n```\nLet me know.";
        assert_eq!(strip_json_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_recovers_object_from_prose() {
        let raw = "The analysis follows. {\"score\": 72, \"remarks\": \"ok\"} Thanks!";
        let map = parse_json_object(raw).unwrap();
        assert_eq!(map["score"], 72);
    }

    #[test]
    fn test_first_object_ignores_braces_in_strings() {
        let raw = r#"noise {"remarks": "uses {curly} braces", "score": 1} {"other": 2}"#;
        assert_eq!(
            first_json_object(raw),
            Some(r#"{"remarks": "uses {curly} braces", "score": 1}"#)
        );
    }

    #[test]
    fn test_unbalanced_object_is_malformed() {
        let err = parse_json_object("{\"score\": 80, \"remarks\": \"cut off").unwrap_err();
        assert!(err.excerpt.contains("cut off"));
    }

    #[test]
    fn test_array_is_not_an_object() {
        let err = parse_json_object("[1, 2, 3]").unwrap_err();
        assert!(err.reason.contains("array"));
    }

    #[test]
    fn test_plain_prose_is_malformed() {
        assert!(parse_json_object("I cannot help with that.").is_err());
    }

    #[test]
    fn test_parse_json_as_typed() {
        #[derive(Deserialize)]
        struct Email {
            subject: String,
        }
        let email: Email = parse_json_as("```json\n{\"subject\": \"Hi\"}\n```").unwrap();
        assert_eq!(email.subject, "Hi");
    }

    #[test]
    fn test_excerpt_marks_truncation() {
        assert_eq!(excerpt("abcdef", 3), "abc…");
        assert_eq!(excerpt("abc", 3), "abc");
    }
}
