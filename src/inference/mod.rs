pub mod decoder;
pub mod provider;
pub mod providers;
pub mod types;

pub use decoder::{LineDecoder, decode_line, parse_line};
pub use provider::{ChatProvider, ChatRequest, ProviderError, StopSignal};
pub use providers::LensProvider;
pub use types::{RawEvent, StreamEvent};
