//! Tolerant parsing of free-form provider responses
//!
//! Providers wrap their JSON in prose, code fences or stray line
//! breaks. Extraction is best-effort and never raises: a response we
//! cannot make sense of yields an empty list, leaving those fields
//! unresolved downstream.

use regex::Regex;
use serde_json::Value;

use super::GeneratedAnswer;

/// Pull label/answer pairs out of a free-form response
///
/// Takes the outermost bracket-delimited span (first `[` to last `]`),
/// tries a strict JSON parse, then one more with raw line breaks
/// collapsed to spaces. Anything else yields an empty list. Number
/// and boolean answer values are stringified; objects and nulls are
/// skipped.
pub fn extract_answer_array(raw: &str) -> Vec<GeneratedAnswer> {
    let Some(span) = array_span(raw) else {
        return Vec::new();
    };

    if let Some(answers) = parse_answer_array(span) {
        return answers;
    }

    let collapsed = span.replace(['\r', '\n'], " ");
    parse_answer_array(&collapsed).unwrap_or_default()
}

/// Normalize a free-form response to a yes/no decision
///
/// Trimmed, lower-cased, compared to the literal token "yes"; any
/// other content means no.
pub fn parse_yes_no(raw: &str) -> bool {
    raw.trim().to_lowercase() == "yes"
}

fn array_span(raw: &str) -> Option<&str> {
    let pattern = Regex::new(r"(?s)\[.*\]").ok()?;
    pattern.find(raw).map(|m| m.as_str())
}

fn parse_answer_array(text: &str) -> Option<Vec<GeneratedAnswer>> {
    let value: Value = serde_json::from_str(text).ok()?;
    let items = value.as_array()?;
    Some(items.iter().filter_map(item_to_answer).collect())
}

fn item_to_answer(item: &Value) -> Option<GeneratedAnswer> {
    let object = item.as_object()?;
    let label = object.get("label")?.as_str()?.to_string();
    let answer = stringify(object.get("answer")?)?;
    Some(GeneratedAnswer { label, answer })
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_array_parses() {
        let raw = r#"[{"label": "Years of experience", "answer": "5"}]"#;
        let answers = extract_answer_array(raw);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].label, "Years of experience");
        assert_eq!(answers[0].answer, "5");
    }

    #[test]
    fn test_surrounding_prose_is_ignored() {
        let raw = concat!(
            "Sure! Here are the answers you asked for:\n\n",
            r#"[{"label": "City", "answer": "Lisbon"}]"#,
            "\n\nLet me know if you need anything else."
        );
        let answers = extract_answer_array(raw);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer, "Lisbon");
    }

    #[test]
    fn test_code_fence_is_ignored() {
        let raw = "```json\n[{\"label\": \"City\", \"answer\": \"Lisbon\"}]\n```";
        let answers = extract_answer_array(raw);
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn test_raw_line_breaks_inside_strings_recover() {
        // Unescaped control characters are invalid JSON; the second
        // parse with line breaks collapsed recovers the array.
        let raw = "[{\"label\": \"Why this\nrole\", \"answer\": \"Growth\"}]";
        let answers = extract_answer_array(raw);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].label, "Why this role");
    }

    #[test]
    fn test_numbers_and_bools_are_stringified() {
        let raw = r#"[
            {"label": "Years", "answer": 5},
            {"label": "Willing to relocate", "answer": true}
        ]"#;
        let answers = extract_answer_array(raw);
        assert_eq!(answers[0].answer, "5");
        assert_eq!(answers[1].answer, "true");
    }

    #[test]
    fn test_malformed_items_are_skipped_not_fatal() {
        let raw = r#"[
            {"label": "Years", "answer": "5"},
            {"wrong": "shape"},
            {"label": "Null answer", "answer": null}
        ]"#;
        let answers = extract_answer_array(raw);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].label, "Years");
    }

    #[test]
    fn test_no_array_yields_empty() {
        assert!(extract_answer_array("I could not find any questions.").is_empty());
        assert!(extract_answer_array("").is_empty());
    }

    #[test]
    fn test_garbage_between_brackets_yields_empty() {
        assert!(extract_answer_array("[this is not json at all]").is_empty());
    }

    #[test]
    fn test_yes_no_normalization() {
        assert!(parse_yes_no("yes"));
        assert!(parse_yes_no("  YES \n"));
        assert!(parse_yes_no("Yes"));
        assert!(!parse_yes_no("no"));
        assert!(!parse_yes_no("yes."));
        assert!(!parse_yes_no("Absolutely, yes"));
        assert!(!parse_yes_no(""));
    }
}
