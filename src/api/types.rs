use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::history::SessionSummary;

/// Errors from the session and status endpoints.
#[derive(Debug)]
pub enum ApiError {
    /// Request could not be sent or the connection failed.
    Network(String),
    /// Non-2xx HTTP status.
    Api { status: u16, message: String },
    /// HTTP succeeded but the envelope carried a non-200 `code`.
    Rejected { code: i64, message: String },
    /// Response body did not have the expected shape.
    Parse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Api { status, message } => write!(f, "API error (HTTP {status}): {message}"),
            ApiError::Rejected { code, message } => write!(f, "request rejected (code {code}): {message}"),
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Parse(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// Standard response wrapper: `{ code, message?, data? }`.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Returns `data` when `code == 200`, otherwise a `Rejected` error.
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.code == 200 {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected {
                code: self.code,
                message: self.message.unwrap_or_else(|| "no message".to_string()),
            })
        }
    }
}

/// Session list responses come either wrapped or as a bare array.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum SessionsResponse {
    Wrapped(Envelope<Vec<SessionSummary>>),
    Bare(Vec<SessionSummary>),
}

impl SessionsResponse {
    pub fn into_sessions(self) -> Result<Vec<SessionSummary>, ApiError> {
        match self {
            SessionsResponse::Wrapped(envelope) => Ok(envelope.into_result()?.unwrap_or_default()),
            SessionsResponse::Bare(sessions) => Ok(sessions),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TitleUpdate<'a> {
    pub user_id: &'a str,
    pub session_id: &'a str,
    pub title: &'a str,
}

/// `GET /health` response.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// `GET /agent/status` response.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AgentStatus {
    /// `ready`, `initializing`, `not_initialized` or `error`.
    pub status: String,
    #[serde(default)]
    pub agent_info: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_success() {
        let env: Envelope<Value> = serde_json::from_value(json!({"code": 200, "data": {"ok": 1}})).unwrap();
        assert_eq!(env.into_result().unwrap(), Some(json!({"ok": 1})));
    }

    #[test]
    fn test_envelope_rejected() {
        let env: Envelope<Value> =
            serde_json::from_value(json!({"code": 403, "message": "not yours"})).unwrap();
        assert!(matches!(
            env.into_result(),
            Err(ApiError::Rejected { code: 403, ref message }) if message == "not yours"
        ));
    }

    #[test]
    fn test_sessions_response_shapes() {
        let wrapped: SessionsResponse = serde_json::from_value(json!({
            "code": 200,
            "data": [{"sessionId": "a", "title": "A", "messages": []}]
        }))
        .unwrap();
        assert_eq!(wrapped.into_sessions().unwrap().len(), 1);

        let bare: SessionsResponse =
            serde_json::from_value(json!([{"sessionId": "b", "title": "", "messages": []}])).unwrap();
        assert_eq!(bare.into_sessions().unwrap()[0].session_id, "b");
    }

    #[test]
    fn test_title_update_wire_shape() {
        let body = TitleUpdate { user_id: "u", session_id: "s", title: "T" };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"userId": "u", "sessionId": "s", "title": "T"})
        );
    }
}
