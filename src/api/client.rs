use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use super::types::{AgentStatus, ApiError, Envelope, Health, SessionsResponse, TitleUpdate};
use crate::core::history::SessionSummary;
use crate::core::title::{TitleCommit, TitleEditor};

/// Client for the session-history and status endpoints.
///
/// All session calls are keyed by `user_id`; the session resource lives at
/// `{base_url}{session_path}` (default `/api/chat`).
pub struct SessionClient {
    base_url: String,
    session_path: String,
    client: reqwest::Client,
}

/// Outcome of [`SessionClient::commit_title`].
#[derive(Debug, PartialEq)]
pub enum RenameOutcome {
    /// The server accepted the new title.
    Renamed(String),
    /// Nothing was sent (blank or unchanged draft).
    Skipped,
    /// The server refused or the request failed; the old title is restored.
    RolledBack(String),
}

impl SessionClient {
    pub fn new(base_url: &str, session_path: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_path: session_path.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn sessions_url(&self) -> String {
        format!("{}{}", self.base_url, self.session_path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        debug!("Session API response status: {}", response.status());
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Session API error: {} - {}", status, message);
            return Err(ApiError::Api { status, message });
        }
        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let body = Self::check(response).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Parse(format!("{e}: {body}")))
    }

    /// Fetches every saved session for a user.
    pub async fn fetch_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, ApiError> {
        let response = self
            .client
            .get(self.sessions_url())
            .query(&[("userId", user_id)])
            .send()
            .await?;
        let sessions = Self::parse::<SessionsResponse>(response).await?.into_sessions()?;
        info!("Fetched {} sessions for {}", sessions.len(), user_id);
        Ok(sessions)
    }

    pub async fn delete_session(&self, user_id: &str, session_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.sessions_url())
            .query(&[("userId", user_id), ("sessionId", session_id)])
            .send()
            .await?;
        Self::parse::<Envelope<serde_json::Value>>(response)
            .await?
            .into_result()?;
        info!("Deleted session {}", session_id);
        Ok(())
    }

    /// Sends `PUT {userId, sessionId, title}`; success means `code == 200`.
    pub async fn update_title(
        &self,
        user_id: &str,
        session_id: &str,
        title: &str,
    ) -> Result<(), ApiError> {
        let body = TitleUpdate {
            user_id,
            session_id,
            title,
        };
        let response = self
            .client
            .put(self.sessions_url())
            .json(&body)
            .send()
            .await?;
        Self::parse::<Envelope<serde_json::Value>>(response)
            .await?
            .into_result()?;
        info!("Session {} renamed", session_id);
        Ok(())
    }

    /// Commits an edited title: sends it if needed, then confirms or rolls back.
    pub async fn commit_title(
        &self,
        user_id: &str,
        session_id: &str,
        editor: &mut TitleEditor,
    ) -> RenameOutcome {
        match editor.commit() {
            TitleCommit::Revert | TitleCommit::Unchanged => RenameOutcome::Skipped,
            TitleCommit::Submit(title) => {
                match self.update_title(user_id, session_id, &title).await {
                    Ok(()) => {
                        editor.confirm();
                        RenameOutcome::Renamed(title)
                    }
                    Err(e) => {
                        warn!("Title update failed, rolling back: {}", e);
                        editor.reject();
                        RenameOutcome::RolledBack(e.to_string())
                    }
                }
            }
        }
    }

    pub async fn health(&self) -> Result<Health, ApiError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn agent_status(&self) -> Result<AgentStatus, ApiError> {
        let response = self
            .client
            .get(format!("{}/agent/status", self.base_url))
            .send()
            .await?;
        Self::parse(response).await
    }
}
