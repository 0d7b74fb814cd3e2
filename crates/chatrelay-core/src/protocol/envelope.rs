//! Envelope model: message kinds, control words and the value payload.
//!
//! Kinds are a closed enum with an `Unknown` arm so a newer server can add
//! tags without breaking older clients.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::media::MediaTag;

/// Content carried by `ENVOI_*` / `RECEPTION_*` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Text,
    Image,
    Audio,
    Video,
    ClientList,
}

impl ContentKind {
    fn suffix(self) -> &'static str {
        match self {
            ContentKind::Text => "TEXT",
            ContentKind::Image => "IMAGE",
            ContentKind::Audio => "AUDIO",
            ContentKind::Video => "VIDEO",
            ContentKind::ClientList => "CLIENT_LIST",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(ContentKind::Text),
            "IMAGE" => Some(ContentKind::Image),
            "AUDIO" => Some(ContentKind::Audio),
            "VIDEO" => Some(ContentKind::Video),
            "CLIENT_LIST" => Some(ContentKind::ClientList),
            _ => None,
        }
    }

    /// Media tag for binary kinds, `None` for text and roster lists.
    pub fn media_tag(self) -> Option<MediaTag> {
        match self {
            ContentKind::Image => Some(MediaTag::Image),
            ContentKind::Audio => Some(MediaTag::Audio),
            ContentKind::Video => Some(MediaTag::Video),
            ContentKind::Text | ContentKind::ClientList => None,
        }
    }
}

impl From<MediaTag> for ContentKind {
    fn from(tag: MediaTag) -> Self {
        match tag {
            MediaTag::Image => ContentKind::Image,
            MediaTag::Audio => ContentKind::Audio,
            MediaTag::Video => ContentKind::Video,
        }
    }
}

/// Server-to-observer notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminEvent {
    ClientConnected,
    ClientDisconnected,
    RoutingLog,
}

/// Message kind (wire field `message_type`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Identity announcement sent right after the transport opens.
    Declaration,
    /// Control words (`ping`, `pong`, `MESSAGE OK`, `Disconnect`).
    SysMessage,
    /// Outbound intent from a client (`ENVOI_*`).
    Send(ContentKind),
    /// Inbound delivery to a client (`RECEPTION_*`).
    Deliver(ContentKind),
    /// Observer notifications (`ADMIN_*`).
    Admin(AdminEvent),
    /// Any tag this build does not know about.
    Unknown(String),
}

const SEND_PREFIX: &str = "ENVOI_";
const DELIVER_PREFIX: &str = "RECEPTION_";

impl MessageKind {
    /// Wire tag.
    pub fn tag(&self) -> String {
        match self {
            MessageKind::Declaration => "DECLARATION".to_string(),
            MessageKind::SysMessage => "SYS_MESSAGE".to_string(),
            MessageKind::Send(c) => format!("{SEND_PREFIX}{}", c.suffix()),
            MessageKind::Deliver(c) => format!("{DELIVER_PREFIX}{}", c.suffix()),
            MessageKind::Admin(AdminEvent::ClientConnected) => "ADMIN_CLIENT_CONNECTED".to_string(),
            MessageKind::Admin(AdminEvent::ClientDisconnected) => {
                "ADMIN_CLIENT_DISCONNECTED".to_string()
            }
            MessageKind::Admin(AdminEvent::RoutingLog) => "ADMIN_ROUTING_LOG".to_string(),
            MessageKind::Unknown(tag) => tag.clone(),
        }
    }

    /// Parse a wire tag. Never fails: unrecognized tags map to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "DECLARATION" => return MessageKind::Declaration,
            "SYS_MESSAGE" => return MessageKind::SysMessage,
            "ADMIN_CLIENT_CONNECTED" => return MessageKind::Admin(AdminEvent::ClientConnected),
            "ADMIN_CLIENT_DISCONNECTED" => {
                return MessageKind::Admin(AdminEvent::ClientDisconnected)
            }
            "ADMIN_ROUTING_LOG" => return MessageKind::Admin(AdminEvent::RoutingLog),
            _ => {}
        }

        if let Some(c) = tag.strip_prefix(SEND_PREFIX).and_then(ContentKind::from_suffix) {
            return MessageKind::Send(c);
        }
        if let Some(c) = tag.strip_prefix(DELIVER_PREFIX).and_then(ContentKind::from_suffix) {
            return MessageKind::Deliver(c);
        }
        MessageKind::Unknown(tag.to_string())
    }

    /// Deliveries that must be acknowledged with `MESSAGE OK`.
    pub fn requires_ack(&self) -> bool {
        matches!(
            self,
            MessageKind::Deliver(
                ContentKind::Text | ContentKind::Image | ContentKind::Audio | ContentKind::Video
            )
        )
    }

    /// Media tag of a binary send/delivery kind.
    pub fn media_tag(&self) -> Option<MediaTag> {
        match self {
            MessageKind::Send(c) | MessageKind::Deliver(c) => c.media_tag(),
            _ => None,
        }
    }
}

impl Serialize for MessageKind {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.tag())
    }
}

impl<'de> Deserialize<'de> for MessageKind {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTag {
            Str(String),
            Int(i64),
        }

        Ok(match RawTag::deserialize(d)? {
            RawTag::Str(s) => MessageKind::from_tag(&s),
            RawTag::Int(n) => MessageKind::Unknown(n.to_string()),
        })
    }
}

/// `SYS_MESSAGE` control words. Exact, case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlWord {
    Ping,
    Pong,
    MessageOk,
    Disconnect,
}

impl ControlWord {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlWord::Ping => "ping",
            ControlWord::Pong => "pong",
            ControlWord::MessageOk => "MESSAGE OK",
            ControlWord::Disconnect => "Disconnect",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ping" => Some(ControlWord::Ping),
            "pong" => Some(ControlWord::Pong),
            "MESSAGE OK" => Some(ControlWord::MessageOk),
            "Disconnect" => Some(ControlWord::Disconnect),
            _ => None,
        }
    }
}

/// Envelope value: plain text or a structured JSON record.
///
/// `Record` is only used for roster lists and routing-log wrapping; it never
/// holds a bare JSON string (that decodes as `Text`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Record(serde_json::Value),
}

impl Default for Value {
    fn default() -> Self {
        Value::Text(String::new())
    }
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Record(v) => Some(v),
            Value::Text(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Record(other),
        }
    }
}

/// The unit of wire communication.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub kind: MessageKind,
    /// Sender id (never empty once declared).
    pub emitter: String,
    /// Recipient id; empty for system-addressed messages.
    pub receiver: String,
    pub value: Value,
    /// Producer timestamp in seconds since the Unix epoch.
    pub timestamp: Option<f64>,
}

impl Envelope {
    pub fn new(
        kind: MessageKind,
        emitter: impl Into<String>,
        receiver: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            kind,
            emitter: emitter.into(),
            receiver: receiver.into(),
            value: value.into(),
            timestamp: None,
        }
    }

    /// `DECLARATION` announcing `username`.
    pub fn declaration(username: &str) -> Self {
        Self::new(MessageKind::Declaration, username, "", "")
    }

    /// System-addressed `SYS_MESSAGE` carrying a control word.
    pub fn control(emitter: &str, word: ControlWord) -> Self {
        Self::new(MessageKind::SysMessage, emitter, "", word.as_str())
    }

    pub fn with_timestamp(mut self, ts: f64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Control word, if this is a `SYS_MESSAGE` carrying a known one.
    pub fn control_word(&self) -> Option<ControlWord> {
        if self.kind != MessageKind::SysMessage {
            return None;
        }
        self.value.as_text().and_then(ControlWord::parse)
    }
}
