//! # Tool Results
//!
//! Tool payloads arrive in whatever shape the backend tool produced: a JSON
//! string, an array, or an object wrapping an array. This module normalises
//! them into something a renderer can walk without re-guessing the shape.

use serde::Deserialize;
use serde_json::Value;

/// Statute search tool; its results double as answer sources.
pub const LAW_SEARCH_TOOL: &str = "search_laws";
/// Court-decision search tool.
pub const CASE_SEARCH_TOOL: &str = "search_cases";

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LawSearchResult {
    pub law_name: String,
    pub article_title: String,
    pub article_content: String,
    pub snippet: String,
    pub law_category: String,
    pub law_type: String,
    pub last_modified: String,
    pub distance: f64,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CaseSearchResult {
    pub case_title: String,
    pub chunk_text: String,
    pub chunk_type: String,
    pub line_idx: i64,
    pub distance: f64,
}

impl CaseSearchResult {
    pub fn chunk_label(&self) -> &str {
        match self.chunk_type.as_str() {
            "sentence" => "Judgment",
            "summary" => "Case summary",
            "reasoning" => "Reasoning",
            other => other,
        }
    }
}

/// Converts a vector distance into a 0-100 similarity score.
pub fn similarity_percent(distance: f64) -> i64 {
    ((1.0 - distance) * 100.0).round() as i64
}

/// Decodes a payload that may be a JSON-encoded string.
fn decoded(payload: &Value) -> Option<Value> {
    match payload {
        Value::String(s) => serde_json::from_str(s).ok(),
        other => Some(other.clone()),
    }
}

/// Extracts the list of records from a search payload.
///
/// Accepts a JSON string, a bare array, an object with a `results` array,
/// or an object whose first field is an array. Anything else is empty.
pub fn result_records(payload: &Value) -> Vec<Value> {
    match decoded(payload) {
        Some(Value::Array(items)) => items,
        Some(Value::Object(map)) => {
            if let Some(Value::Array(items)) = map.get("results") {
                return items.clone();
            }
            match map.values().next() {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

/// Returns the error message if the payload reports a tool failure.
pub fn error_message(payload: &Value) -> Option<String> {
    let value = decoded(payload)?;
    let error = value.as_object()?.get("error")?;
    Some(match error {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::String(_) | Value::Null | Value::Bool(false) => "Unknown error".to_string(),
        other => other.to_string(),
    })
}

/// How a tool result should be presented.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Error(String),
    Laws(Vec<LawSearchResult>),
    Cases(Vec<CaseSearchResult>),
    /// A JSON array of arbitrary records.
    Records(Vec<Value>),
    /// A JSON object, shown as key/value pairs.
    Fields(Vec<(String, String)>),
    Text(String),
}

fn typed_records<T: for<'de> Deserialize<'de>>(payload: &Value) -> Vec<T> {
    result_records(payload)
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

impl ToolOutcome {
    pub fn classify(tool_name: &str, payload: &Value) -> ToolOutcome {
        if let Some(message) = error_message(payload) {
            return ToolOutcome::Error(message);
        }

        match tool_name {
            LAW_SEARCH_TOOL => return ToolOutcome::Laws(typed_records(payload)),
            CASE_SEARCH_TOOL => return ToolOutcome::Cases(typed_records(payload)),
            _ => {}
        }

        match payload {
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Array(items)) => ToolOutcome::Records(items),
                Ok(Value::Object(map)) => ToolOutcome::Fields(fields(&map)),
                _ => ToolOutcome::Text(s.clone()),
            },
            Value::Array(items) => ToolOutcome::Records(items.clone()),
            Value::Object(map) => ToolOutcome::Fields(fields(map)),
            Value::Null => ToolOutcome::Text(String::new()),
            other => ToolOutcome::Text(other.to_string()),
        }
    }
}

fn fields(map: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(k, v)| {
            let shown = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), shown)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_from_json_string() {
        let payload = json!("[{\"law_name\":\"Civil Code\"}]");
        assert_eq!(result_records(&payload), vec![json!({"law_name": "Civil Code"})]);
    }

    #[test]
    fn test_records_from_results_field() {
        let payload = json!({"count": 1, "results": [{"a": 1}]});
        assert_eq!(result_records(&payload), vec![json!({"a": 1})]);
    }

    #[test]
    fn test_records_from_first_array_field() {
        let payload = json!({"laws": [{"a": 1}, {"a": 2}]});
        assert_eq!(result_records(&payload).len(), 2);
    }

    #[test]
    fn test_records_from_unparseable_string() {
        assert!(result_records(&json!("not json")).is_empty());
        assert!(result_records(&json!("[]")).is_empty());
    }

    #[test]
    fn test_error_detection_object_and_string() {
        assert_eq!(
            error_message(&json!({"error": "index offline"})).as_deref(),
            Some("index offline")
        );
        assert_eq!(
            error_message(&json!("{\"error\":\"quota\"}")).as_deref(),
            Some("quota")
        );
        assert_eq!(error_message(&json!({"error": ""})).as_deref(), Some("Unknown error"));
        assert!(error_message(&json!("[]")).is_none());
        assert!(error_message(&json!({"ok": true})).is_none());
    }

    #[test]
    fn test_classify_laws() {
        let payload = json!("[{\"law_name\":\"Civil Code\",\"article_title\":\"Art. 184\",\"distance\":0.25}]");
        match ToolOutcome::classify(LAW_SEARCH_TOOL, &payload) {
            ToolOutcome::Laws(laws) => {
                assert_eq!(laws.len(), 1);
                assert_eq!(laws[0].article_title, "Art. 184");
                assert_eq!(similarity_percent(laws[0].distance), 75);
            }
            other => panic!("expected laws, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_cases_with_labels() {
        let payload = json!([{"case_title": "T v. U", "chunk_type": "summary", "distance": 0.1}]);
        match ToolOutcome::classify(CASE_SEARCH_TOOL, &payload) {
            ToolOutcome::Cases(cases) => {
                assert_eq!(cases[0].chunk_label(), "Case summary");
                assert_eq!(similarity_percent(cases[0].distance), 90);
            }
            other => panic!("expected cases, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_error_wins_over_tool_name() {
        let payload = json!({"error": "timeout"});
        assert_eq!(
            ToolOutcome::classify(LAW_SEARCH_TOOL, &payload),
            ToolOutcome::Error("timeout".into())
        );
    }

    #[test]
    fn test_classify_generic_shapes() {
        assert_eq!(
            ToolOutcome::classify("web", &json!("[1,2]")),
            ToolOutcome::Records(vec![json!(1), json!(2)])
        );
        assert_eq!(
            ToolOutcome::classify("web", &json!({"url": "https://x", "n": 2})),
            ToolOutcome::Fields(vec![
                ("n".into(), "2".into()),
                ("url".into(), "https://x".into())
            ])
        );
        assert_eq!(
            ToolOutcome::classify("web", &json!("plain words")),
            ToolOutcome::Text("plain words".into())
        );
    }
}
