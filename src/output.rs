//! Output formatting and control utilities.
//!
//! CHANGELOG:
//! - 06/02/2026 - Plain-text rendering of match results
//! - 02/02/2026 - Initial implementation

use serde::Serialize;
use serde_json::{json, Value};

use crate::engine::MatchResult;

/// Output control settings from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct OutputControls {
    pub json: bool,
    pub compact: bool,
    pub fields: Option<String>,
    pub max_text_chars: Option<u32>,
}

impl OutputControls {
    /// Emit data according to output controls.
    pub fn emit<T: Serialize>(&self, data: &T) -> String {
        let value = serde_json::to_value(data).unwrap_or(json!(null));

        let filtered = match self.fields {
            Some(ref fields) => filter_fields(&value, fields),
            None => value,
        };

        let truncated = match self.max_text_chars {
            Some(max_chars) => truncate_text_fields(&filtered, max_chars as usize),
            None => filtered,
        };

        if self.compact {
            serde_json::to_string(&truncated).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string_pretty(&truncated).unwrap_or_else(|_| "{}".to_string())
        }
    }

    /// Print data to stdout according to output controls.
    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.emit(data));
    }

    /// Print match results, one per line, or as JSON when requested.
    pub fn print_results(&self, results: &[MatchResult]) {
        if self.json || self.compact || self.fields.is_some() {
            self.print(&results);
        } else {
            println!("{}", render_results(results));
        }
    }
}

/// Human-readable listing of results.
pub fn render_results(results: &[MatchResult]) -> String {
    if results.is_empty() {
        return "No matches found.".to_string();
    }
    let mut lines: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{:>3}. {}", i + 1, r))
        .collect();
    lines.push(format!("{} match(es).", results.len()));
    lines.join("\n")
}

/// Filter JSON value to only include specified fields.
fn filter_fields(value: &Value, fields: &str) -> Value {
    let field_list: Vec<&str> = fields.split(',').map(|s| s.trim()).collect();

    match value {
        Value::Array(arr) => Value::Array(arr.iter().map(|v| filter_fields(v, fields)).collect()),
        Value::Object(map) => {
            let mut filtered = serde_json::Map::new();
            for field in &field_list {
                if let Some(v) = map.get(*field) {
                    filtered.insert(field.to_string(), v.clone());
                }
            }
            Value::Object(filtered)
        }
        _ => value.clone(),
    }
}

/// Truncate string fields in JSON value, counting characters.
fn truncate_text_fields(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(s) if s.chars().count() > max_chars => {
            let head: String = s.chars().take(max_chars).collect();
            Value::String(format!("{}...", head))
        }
        Value::Array(arr) => {
            Value::Array(arr.iter().map(|v| truncate_text_fields(v, max_chars)).collect())
        }
        Value::Object(map) => {
            let mut truncated = serde_json::Map::new();
            for (k, v) in map {
                truncated.insert(k.clone(), truncate_text_fields(v, max_chars));
            }
            Value::Object(truncated)
        }
        _ => value.clone(),
    }
}

/// Format error as JSON.
pub fn format_error(error: &str) -> String {
    serde_json::to_string(&json!({
        "error": error,
        "success": false
    }))
    .unwrap_or_else(|_| format!(r#"{{"error":"{}"}}"#, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> MatchResult {
        MatchResult {
            id_a: "QUERY_jon".into(),
            text_a: "jon".into(),
            id_b: "L_3".into(),
            text_b: "Jonathan Müller".into(),
            score: 0.75,
            measure_name: "PASS_THROUGH(JARO_WINKLER)".into(),
        }
    }

    #[test]
    fn test_fields_filter() {
        let out = OutputControls {
            compact: true,
            fields: Some("id_b, score".into()),
            ..Default::default()
        };
        assert_eq!(out.emit(&vec![result()]), r#"[{"id_b":"L_3","score":0.75}]"#);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let out = OutputControls {
            compact: true,
            fields: Some("text_b".into()),
            max_text_chars: Some(12),
            ..Default::default()
        };
        assert_eq!(out.emit(&result()), r#"{"text_b":"Jonathan Mül..."}"#);
    }

    #[test]
    fn test_render_results() {
        assert_eq!(render_results(&[]), "No matches found.");
        let text = render_results(&[result()]);
        assert!(text.starts_with("  1. Match: ('jon' (Query), 'Jonathan Müller')"));
        assert!(text.ends_with("1 match(es)."));
    }

    #[test]
    fn test_format_error() {
        let v: Value = serde_json::from_str(&format_error("boom")).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "boom");
    }
}
