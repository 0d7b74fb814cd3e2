//! Transport seam for the protocol client.
//!
//! The client only needs a way to write text frames and a stream of inbound
//! transport events. `ws` provides the production WebSocket implementation;
//! tests plug in in-memory halves.

pub mod ws;

use async_trait::async_trait;

use chatrelay_core::Result;

/// Inbound transport event.
#[derive(Debug)]
pub enum TransportEvent {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame (decoded as UTF-8 JSON by the client).
    Binary(Vec<u8>),
    /// Peer closed the connection.
    Closed { code: Option<u16>, reason: String },
    /// Transport-level failure. The connection is unusable afterwards.
    Error(String),
}

/// Write half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
}

/// Read half of a connection. `None` means the stream ended without a close frame.
#[async_trait]
pub trait FrameSource: Send {
    async fn recv(&mut self) -> Option<TransportEvent>;
}
