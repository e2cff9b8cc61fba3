use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc::Sender;

use super::types::StreamEvent;

/// Errors that can occur while streaming a chat turn.
#[derive(Debug)]
pub enum ProviderError {
    /// Provider misconfigured (bad URL, unbuildable client).
    Config(String),
    /// Network-level failure (DNS, connection refused, reset mid-stream).
    Network(String),
    /// The request exceeded its time ceiling and was aborted.
    Timeout,
    /// Backend answered with a non-2xx status.
    Api { status: u16, message: String },
    /// Request or response could not be (de)serialized.
    Parse(String),
    /// The turn handler dropped the receiver.
    ChannelClosed,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::Network(msg) => write!(f, "network error: {msg}"),
            ProviderError::Timeout => write!(f, "request timed out"),
            ProviderError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ProviderError::Parse(msg) => write!(f, "parse error: {msg}"),
            ProviderError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Cooperative stop flag shared between the caller and a running stream.
///
/// Checked once per network read. Bytes already pulled off the wire are
/// discarded, not un-read.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Everything a provider needs to run one turn.
pub struct ChatRequest<'a> {
    pub query: &'a str,
    /// Merged into the request body after `query` (later keys win).
    pub extra_params: &'a Map<String, Value>,
}

impl ChatRequest<'_> {
    /// The JSON body sent to the streaming endpoint.
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), Value::String(self.query.to_string()));
        for (k, v) in self.extra_params {
            body.insert(k.clone(), v.clone());
        }
        Value::Object(body)
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the name of the provider.
    fn name(&self) -> &str;

    /// Streams one turn, sending decoded events to `sender` in arrival order.
    async fn stream_chat(
        &self,
        request: ChatRequest<'_>,
        sender: Sender<StreamEvent>,
        stop: StopSignal,
    ) -> Result<(), ProviderError>;
}
