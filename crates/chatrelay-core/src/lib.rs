//! chatrelay core: transport-agnostic protocol primitives, media encoding, and errors.
//!
//! This crate defines the wire envelope shared with the routing server and the
//! error surface used by the client and dashboard crates. It carries no
//! transport or runtime dependencies so it can be reused by any front end.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed frames and media payloads surface as `RelayError::Decode` so a
//! bad message never takes a connection down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod media;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, RelayError, Result};
