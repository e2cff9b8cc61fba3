//! # Session History
//!
//! Summaries of saved chats as returned by the session API, and the store
//! the sidebar reads from. The store is an ordinary value handed to whoever
//! needs it; nothing here reaches for global state.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::message::Message;

/// Placeholder shown for sessions that were never titled.
pub const UNTITLED: &str = "New chat";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Set when the chat belongs to a specific legal case.
    #[serde(default, rename = "user_case_id", skip_serializing_if = "Option::is_none")]
    pub user_case_id: Option<String>,
}

/// Naive layouts written by backends that drop the offset; read as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// One bad timestamp must not sink the whole session list.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => {
            let parsed = parse_timestamp(&raw);
            if parsed.is_none() {
                warn!("Unreadable session timestamp {:?}, ignored", raw);
            }
            parsed
        }
        Some(Value::Null) | None => None,
        Some(other) => {
            warn!("Unexpected session timestamp {}, ignored", other);
            None
        }
    })
}

impl SessionSummary {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Default)]
pub struct HistoryStore {
    sessions: Vec<SessionSummary>,
}

impl HistoryStore {
    pub fn new(sessions: Vec<SessionSummary>) -> Self {
        let mut store = Self::default();
        store.replace(sessions);
        store
    }

    /// Replaces the list, most recently updated first.
    pub fn replace(&mut self, mut sessions: Vec<SessionSummary>) {
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.sessions = sessions;
    }

    pub fn all(&self) -> &[SessionSummary] {
        &self.sessions
    }

    /// General chats only; case-bound chats live under their case.
    pub fn sidebar(&self) -> Vec<&SessionSummary> {
        self.sessions
            .iter()
            .filter(|s| s.user_case_id.is_none())
            .collect()
    }

    pub fn find(&self, session_id: &str) -> Option<&SessionSummary> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }

    /// Removes a session, returning it if it was present.
    pub fn remove(&mut self, session_id: &str) -> Option<SessionSummary> {
        let pos = self.sessions.iter().position(|s| s.session_id == session_id)?;
        Some(self.sessions.remove(pos))
    }

    /// Sets a session's title, returning the previous one.
    pub fn rename(&mut self, session_id: &str, title: &str) -> Option<String> {
        let session = self.sessions.iter_mut().find(|s| s.session_id == session_id)?;
        Some(std::mem::replace(&mut session.title, title.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(id: &str, updated: &str, case: Option<&str>) -> SessionSummary {
        let mut value = json!({
            "sessionId": id,
            "title": format!("Chat {id}"),
            "messages": [],
            "updatedAt": updated,
        });
        if let Some(case) = case {
            value["user_case_id"] = json!(case);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_summary_parses_wire_shape() {
        let s = summary("a", "2026-10-02T08:30:00Z", Some("case-1"));
        assert_eq!(s.session_id, "a");
        assert_eq!(s.user_case_id.as_deref(), Some("case-1"));
        assert!(s.updated_at.is_some());
        assert!(s.created_at.is_none());
    }

    #[test]
    fn test_naive_and_bad_timestamps_do_not_fail_the_list() {
        let sessions: Vec<SessionSummary> = serde_json::from_value(json!([
            {"sessionId": "naive", "messages": [], "updatedAt": "2026-10-01T10:00:00.123456"},
            {"sessionId": "spaced", "messages": [], "createdAt": "2026-10-01 09:30:00"},
            {"sessionId": "junk", "messages": [], "updatedAt": "yesterday", "createdAt": 17},
            {"sessionId": "null", "messages": [], "updatedAt": null}
        ]))
        .unwrap();
        assert_eq!(sessions.len(), 4);
        assert_eq!(
            sessions[0].updated_at.unwrap().to_rfc3339(),
            "2026-10-01T10:00:00.123456+00:00"
        );
        assert_eq!(
            sessions[1].created_at.unwrap().to_rfc3339(),
            "2026-10-01T09:30:00+00:00"
        );
        assert!(sessions[2].updated_at.is_none());
        assert!(sessions[2].created_at.is_none());
        assert!(sessions[3].updated_at.is_none());
    }

    #[test]
    fn test_parse_timestamp_offsets() {
        assert_eq!(
            parse_timestamp("2026-10-01T12:00:00+02:00").unwrap().to_rfc3339(),
            "2026-10-01T10:00:00+00:00"
        );
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_sorted_newest_first() {
        let store = HistoryStore::new(vec![
            summary("old", "2026-01-01T00:00:00Z", None),
            summary("new", "2026-10-01T00:00:00Z", None),
        ]);
        let ids: Vec<_> = store.all().iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_sidebar_hides_case_sessions() {
        let store = HistoryStore::new(vec![
            summary("a", "2026-01-01T00:00:00Z", None),
            summary("b", "2026-01-02T00:00:00Z", Some("case-7")),
        ]);
        let sidebar = store.sidebar();
        assert_eq!(sidebar.len(), 1);
        assert_eq!(sidebar[0].session_id, "a");
    }

    #[test]
    fn test_display_title_placeholder() {
        let mut s = summary("a", "2026-01-01T00:00:00Z", None);
        s.title = "  ".into();
        assert_eq!(s.display_title(), UNTITLED);
    }

    #[test]
    fn test_rename_and_remove() {
        let mut store = HistoryStore::new(vec![summary("a", "2026-01-01T00:00:00Z", None)]);
        assert_eq!(store.rename("a", "Leases").as_deref(), Some("Chat a"));
        assert_eq!(store.find("a").unwrap().title, "Leases");
        assert!(store.rename("missing", "x").is_none());
        assert!(store.remove("a").is_some());
        assert!(store.find("a").is_none());
    }
}
