//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use async_trait::async_trait;
use serde_json::Map;
use tokio::sync::mpsc::Sender;

use crate::core::state::ChatState;
use crate::inference::{ChatProvider, ChatRequest, ProviderError, StopSignal, StreamEvent};

/// A provider that replays a fixed list of events.
pub struct ScriptedProvider {
    pub events: Vec<StreamEvent>,
    pub fail_with: Option<String>,
}

impl ScriptedProvider {
    pub fn new(events: Vec<StreamEvent>) -> Self {
        Self { events, fail_with: None }
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_chat(
        &self,
        _request: ChatRequest<'_>,
        sender: Sender<StreamEvent>,
        stop: StopSignal,
    ) -> Result<(), ProviderError> {
        for event in self.events.clone() {
            if stop.is_stopped() {
                return Ok(());
            }
            sender
                .send(event)
                .await
                .map_err(|_| ProviderError::ChannelClosed)?;
        }
        match &self.fail_with {
            Some(message) => Err(ProviderError::Network(message.clone())),
            None => Ok(()),
        }
    }
}

/// Creates a ChatState with default settings and no extra params.
pub fn test_state() -> ChatState {
    ChatState::new("search_laws", Map::new())
}
