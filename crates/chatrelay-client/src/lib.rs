//! chatrelay protocol client.
//!
//! Owns one connection to the routing server: handshake, keepalive replies,
//! delivery acknowledgment, and typed event delivery to the consumer. The
//! WebSocket transport lives behind the `transport` traits so tests and other
//! front ends can supply their own.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod client;
pub mod config;
pub mod input;
pub mod transport;

pub use client::{ClientEvent, ClientOptions, ConnState, RelayClient};
