//! Client side of the UCI protocol for an external move-search engine.

pub mod client;
pub mod protocol;
pub mod transport;

use std::time::Duration;

pub use client::{UciClient, DEFAULT_TIMEOUT};
pub use protocol::{parse_reply, EngineCommand, EngineLine};
pub use transport::{ChannelTransport, EngineEndpoint, EngineTransport, ProcessTransport};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine {command:?}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine channel closed")]
    Closed,
    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),
}
