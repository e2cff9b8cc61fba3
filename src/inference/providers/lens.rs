//! Lens chat backend provider.
//!
//! Talks to `POST {base_url}{stream_path}` with `Accept: text/event-stream`.
//! The body is a stream of `data: {json}` lines (blank lines and `:`
//! heartbeat comments in between); every field of the JSON is optional and
//! a single line may carry several events, see [`RawEvent::into_events`].
//!
//! [`RawEvent::into_events`]: crate::inference::RawEvent::into_events

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

use crate::inference::decoder::{LineDecoder, decode_line};
use crate::inference::{ChatProvider, ChatRequest, ProviderError, StopSignal, StreamEvent};

pub const DEFAULT_STREAM_PATH: &str = "/chat/stream";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// HTTP provider for the Lens streaming chat endpoint.
pub struct LensProvider {
    base_url: String,
    stream_path: String,
    client: reqwest::Client,
}

impl LensProvider {
    /// Creates a provider whose requests are aborted after `timeout`.
    pub fn new(
        base_url: String,
        stream_path: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            stream_path: stream_path.unwrap_or_else(|| DEFAULT_STREAM_PATH.to_string()),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.stream_path)
    }

    async fn send_request(&self, body: &serde_json::Value) -> Result<reqwest::Response, ProviderError> {
        let json_body = serde_json::to_string(body)
            .map_err(|e| ProviderError::Parse(format!("Request serialization failed: {e}")))?;
        info!("Lens chat request: {}", json_body);

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .body(json_body)
            .send()
            .await?;

        debug!("Lens response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Lens API error: {} - {}", status, err_body);
            return Err(ProviderError::Api {
                status,
                message: err_body,
            });
        }

        Ok(response)
    }
}

async fn forward(
    sender: &Sender<StreamEvent>,
    events: Vec<StreamEvent>,
) -> Result<usize, ProviderError> {
    let count = events.len();
    for event in events {
        if sender.send(event).await.is_err() {
            warn!("Event send failed: receiver dropped");
            return Err(ProviderError::ChannelClosed);
        }
    }
    Ok(count)
}

#[async_trait]
impl ChatProvider for LensProvider {
    fn name(&self) -> &str {
        "lens"
    }

    async fn stream_chat(
        &self,
        request: ChatRequest<'_>,
        sender: Sender<StreamEvent>,
        stop: StopSignal,
    ) -> Result<(), ProviderError> {
        let response = self.send_request(&request.body()).await?;

        let mut decoder = LineDecoder::new();
        let mut bytes = response.bytes_stream();
        let mut event_count = 0usize;

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            if stop.is_stopped() {
                info!("Stop requested, abandoning stream after {} events", event_count);
                return Ok(());
            }
            debug!("Raw chunk received: {} bytes", chunk.len());

            for line in decoder.push(&chunk) {
                event_count += forward(&sender, decode_line(&line)).await?;
            }
        }

        if let Some(rest) = decoder.finish() {
            debug!("Parsing trailing buffer: {} bytes", rest.len());
            event_count += forward(&sender, decode_line(&rest)).await?;
        }

        info!("Stream ended: {} events", event_count);
        Ok(())
    }
}
