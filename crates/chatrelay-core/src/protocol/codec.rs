//! Envelope codec (JSON text frames).
//!
//! Wire shape:
//! `{"message_type": <tag>, "data": {"emitter", "receiver", "value", "timestamp"?}}`
//!
//! The top level is strict (`deny_unknown_fields`); `data` tolerates extra keys
//! so the server can grow the payload without breaking older clients.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RelayError, Result};
use crate::protocol::envelope::{Envelope, MessageKind, Value};

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireEnvelope {
    message_type: MessageKind,
    data: WireData,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireData {
    emitter: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    receiver: String,
    #[serde(default)]
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<f64>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Serialize an envelope into a text frame.
pub fn encode(env: &Envelope) -> Result<String> {
    let wire = WireEnvelope {
        message_type: env.kind.clone(),
        data: WireData {
            emitter: env.emitter.clone(),
            receiver: env.receiver.clone(),
            value: env.value.clone(),
            timestamp: env.timestamp,
        },
    };
    serde_json::to_string(&wire)
        .map_err(|e| RelayError::Internal(format!("envelope encode failed: {e}")))
}

/// Parse a text frame into an envelope.
pub fn decode(s: &str) -> Result<Envelope> {
    let wire: WireEnvelope = serde_json::from_str(s)
        .map_err(|e| RelayError::Decode(format!("invalid envelope json: {e}")))?;
    Ok(Envelope {
        kind: wire.message_type,
        emitter: wire.data.emitter,
        receiver: wire.data.receiver,
        value: wire.data.value,
        timestamp: wire.data.timestamp,
    })
}

/// Parse a raw frame, validating UTF-8 first.
pub fn decode_bytes(b: &[u8]) -> Result<Envelope> {
    let s = std::str::from_utf8(b).map_err(|e| RelayError::Decode(format!("utf8 invalid: {e}")))?;
    decode(s)
}
