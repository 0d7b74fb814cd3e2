//! Bounded, ordered event history.
//!
//! Entries get a sequence id at insertion. Ids are never reused, and eviction
//! pops from the front, so retained entries keep the ids they were given.

use std::collections::VecDeque;

use serde::Serialize;

use chatrelay_core::media::MediaTag;
use chatrelay_core::protocol::{AdminEvent, MessageKind, Value};

/// Derived classification of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Text,
    Image,
    Audio,
    Video,
    Event,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Text => "text",
            Classification::Image => "image",
            Classification::Audio => "audio",
            Classification::Video => "video",
            Classification::Event => "event",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Classification::Text),
            "image" => Some(Classification::Image),
            "audio" => Some(Classification::Audio),
            "video" => Some(Classification::Video),
            "event" => Some(Classification::Event),
            _ => None,
        }
    }
}

impl From<MediaTag> for Classification {
    fn from(tag: MediaTag) -> Self {
        match tag {
            MediaTag::Image => Classification::Image,
            MediaTag::Audio => Classification::Audio,
            MediaTag::Video => Classification::Video,
        }
    }
}

/// One retained event. Consumers always get clones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub timestamp: f64,
    /// Wire tag of the (unwrapped) message kind.
    pub message_type: String,
    pub kind: Classification,
    pub emitter: String,
    pub receiver: String,
    /// Full text, or a placeholder for media.
    pub value: Value,
}

/// Fields of an entry before it is numbered.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub timestamp: f64,
    pub kind: MessageKind,
    pub emitter: String,
    pub receiver: String,
    pub value: Value,
}

impl PendingEntry {
    fn into_entry(self, id: u64) -> HistoryEntry {
        let class = classify(&self.kind, &self.value);
        let value = summarize(&self.kind, &self.value);
        HistoryEntry {
            id,
            timestamp: self.timestamp,
            message_type: self.kind.tag(),
            kind: class,
            emitter: self.emitter,
            receiver: self.receiver,
            value,
        }
    }
}

/// `kind` carried by a structured value, when it names a known class.
fn record_kind(value: &Value) -> Option<Classification> {
    value
        .as_record()?
        .get("kind")?
        .as_str()
        .and_then(Classification::parse)
}

pub fn classify(kind: &MessageKind, value: &Value) -> Classification {
    if let Some(c) = record_kind(value) {
        return c;
    }
    if let Some(tag) = kind.media_tag() {
        return tag.into();
    }
    match kind {
        MessageKind::Admin(AdminEvent::ClientConnected | AdminEvent::ClientDisconnected) => {
            Classification::Event
        }
        _ => Classification::Text,
    }
}

/// Replace media payloads with `[image]`/`[audio]`/`[video]`; raw bytes are never retained.
pub fn summarize(kind: &MessageKind, value: &Value) -> Value {
    if let Some(c) = record_kind(value) {
        return Value::Text(format!("[{}]", c.as_str()));
    }
    let tag = value
        .as_text()
        .and_then(MediaTag::detect)
        .or_else(|| kind.media_tag());
    match tag {
        Some(tag) => Value::Text(format!("[{}]", tag.label())),
        None => value.clone(),
    }
}

pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    next_id: u64,
    evicted: u64,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_id: 1,
            evicted: 0,
        }
    }

    /// Number and append; evict from the front past capacity. Returns the new id.
    pub fn push(&mut self, pending: PendingEntry) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(pending.into_entry(id));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        id
    }

    /// Entries with an id strictly greater than `cursor`, oldest first.
    pub fn since(&self, cursor: u64) -> Vec<HistoryEntry> {
        let start = self.entries.partition_point(|e| e.id <= cursor);
        self.entries.range(start..).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::protocol::ContentKind;

    fn pending(kind: MessageKind, value: Value) -> PendingEntry {
        PendingEntry {
            timestamp: 1.0,
            kind,
            emitter: "a".into(),
            receiver: "b".into(),
            value,
        }
    }

    #[test]
    fn media_values_are_redacted() {
        let e = pending(MessageKind::Deliver(ContentKind::Audio), "AUDIO:AAAA".into()).into_entry(1);
        assert_eq!(e.kind, Classification::Audio);
        assert_eq!(e.value, Value::Text("[audio]".into()));

        // Media kind without a tag is still redacted.
        let e = pending(MessageKind::Send(ContentKind::Video), "AAAA".into()).into_entry(2);
        assert_eq!(e.value, Value::Text("[video]".into()));
    }

    #[test]
    fn tagged_text_is_redacted_but_stays_text() {
        let e = pending(MessageKind::Send(ContentKind::Text), "IMG:AQID".into()).into_entry(1);
        assert_eq!(e.kind, Classification::Text);
        assert_eq!(e.value, Value::Text("[image]".into()));
    }

    #[test]
    fn record_kind_wins() {
        let v = Value::Record(serde_json::json!({"kind": "video", "size": 10}));
        let e = pending(MessageKind::Send(ContentKind::Text), v).into_entry(1);
        assert_eq!(e.kind, Classification::Video);
        assert_eq!(e.value, Value::Text("[video]".into()));
    }

    #[test]
    fn connection_events_are_events() {
        let e = pending(MessageKind::Admin(AdminEvent::ClientDisconnected), "".into()).into_entry(1);
        assert_eq!(e.kind, Classification::Event);
        assert_eq!(e.message_type, "ADMIN_CLIENT_DISCONNECTED");
    }

    #[test]
    fn eviction_keeps_ids() {
        let mut h = History::new(3);
        for _ in 0..5 {
            h.push(pending(MessageKind::Deliver(ContentKind::Text), "x".into()));
        }
        let ids: Vec<u64> = h.since(0).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert_eq!(h.evicted(), 2);
        assert_eq!(h.since(4).len(), 1);
        assert!(h.since(5).is_empty());
    }
}
