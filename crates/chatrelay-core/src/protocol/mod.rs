//! Protocol modules (envelope model + JSON codec).
//!
//! The codec is panic-free: malformed input is reported as
//! `RelayError::Decode` instead of panicking, so a hostile or buggy peer can
//! only cost us the frame it sent.

pub mod codec;
pub mod envelope;

pub use codec::{decode, decode_bytes, encode};
pub use envelope::{AdminEvent, ContentKind, ControlWord, Envelope, MessageKind, Value};
