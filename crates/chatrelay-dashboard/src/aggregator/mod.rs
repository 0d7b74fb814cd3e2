//! Event aggregation for the observer dashboard.
//!
//! One writer (the admin feed) and many readers (SSE subscribers). All state
//! sits behind a single `RwLock` so a reader always sees a roster and a history
//! that belong together.

pub mod history;
pub mod roster;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use chatrelay_core::protocol::{AdminEvent, ContentKind, Envelope, MessageKind, Value};

pub use history::{Classification, HistoryEntry};
pub use roster::Roster;

use history::{History, PendingEntry};

pub const DEFAULT_HISTORY_CAPACITY: usize = 500;
pub const DEFAULT_OBSERVER_PREFIX: &str = "ADMIN";
pub const SERVER_ID: &str = "SERVER";
const WELCOME_SENTINELS: [&str; 2] = ["Bienvenue", "Bienvenue !"];

/// What `ingest` did with an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Roster,
    Appended(u64),
    Suppressed,
    Ignored,
}

impl IngestOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            IngestOutcome::Roster => "roster",
            IngestOutcome::Appended(_) => "appended",
            IngestOutcome::Suppressed => "suppressed",
            IngestOutcome::Ignored => "ignored",
        }
    }
}

/// Consistent view handed to readers.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Sorted participant ids.
    pub roster: Vec<String>,
    /// Entries newer than the requested cursor, oldest first.
    pub entries: Vec<HistoryEntry>,
}

struct State {
    roster: Roster,
    history: History,
}

pub struct EventAggregator {
    state: RwLock<State>,
    observer_prefix: String,
}

impl EventAggregator {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RwLock::new(State {
                roster: Roster::default(),
                history: History::new(capacity),
            }),
            observer_prefix: DEFAULT_OBSERVER_PREFIX.to_string(),
        }
    }

    /// Ids starting with `prefix` (any case) are kept out of the roster.
    pub fn with_observer_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.observer_prefix = prefix.into();
        self
    }

    pub fn ingest(&self, env: &Envelope) -> IngestOutcome {
        self.ingest_at(env, now_secs())
    }

    /// Apply one envelope, with `now` as the receipt time.
    pub fn ingest_at(&self, env: &Envelope, now: f64) -> IngestOutcome {
        match &env.kind {
            MessageKind::Deliver(ContentKind::ClientList) => {
                // Parse outside the lock, swap inside.
                let roster = Roster::from_value(&env.value, &self.observer_prefix);
                self.write().roster = roster;
                IngestOutcome::Roster
            }
            MessageKind::Admin(AdminEvent::RoutingLog) => {
                let pending = unwrap_routing_log(env, now);
                self.append_unless_welcome(pending)
            }
            MessageKind::Admin(AdminEvent::ClientConnected | AdminEvent::ClientDisconnected) => {
                IngestOutcome::Appended(self.write().history.push(pending_from(env, now)))
            }
            MessageKind::Deliver(
                ContentKind::Text | ContentKind::Image | ContentKind::Audio | ContentKind::Video,
            ) => self.append_unless_welcome(pending_from(env, now)),
            _ => IngestOutcome::Ignored,
        }
    }

    fn append_unless_welcome(&self, pending: PendingEntry) -> IngestOutcome {
        if is_welcome(&pending.emitter, &pending.value) {
            return IngestOutcome::Suppressed;
        }
        IngestOutcome::Appended(self.write().history.push(pending))
    }

    /// Roster plus every entry with an id greater than `cursor`, under one read lock.
    pub fn snapshot_since(&self, cursor: u64) -> Snapshot {
        let state = self.read();
        Snapshot {
            roster: state.roster.to_vec(),
            entries: state.history.since(cursor),
        }
    }

    pub fn roster(&self) -> Vec<String> {
        self.read().roster.to_vec()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.read().history.since(0)
    }

    pub fn len(&self) -> usize {
        self.read().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.read().history.capacity()
    }

    /// Entries dropped from the front since startup.
    pub fn evicted_total(&self) -> u64 {
        self.read().history.evicted()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

fn is_welcome(emitter: &str, value: &Value) -> bool {
    emitter == SERVER_ID
        && value
            .as_text()
            .is_some_and(|v| WELCOME_SENTINELS.contains(&v))
}

fn pending_from(env: &Envelope, now: f64) -> PendingEntry {
    PendingEntry {
        timestamp: now,
        kind: env.kind.clone(),
        emitter: env.emitter.clone(),
        receiver: env.receiver.clone(),
        value: env.value.clone(),
    }
}

/// Pull the routed message out of an `ADMIN_ROUTING_LOG` record.
///
/// Each field is taken from the inner record when present and well-typed,
/// otherwise from the outer envelope (and the receipt time for the timestamp).
/// A record without a `value` yields a null value.
fn unwrap_routing_log(env: &Envelope, now: f64) -> PendingEntry {
    let inner = match env.value.as_record().and_then(|v| v.as_object()) {
        Some(obj) => obj,
        None => {
            tracing::debug!(emitter = %env.emitter, "routing log without a record, using outer fields");
            return PendingEntry {
                timestamp: env.timestamp.unwrap_or(now),
                ..pending_from(env, now)
            };
        }
    };

    let kind = match inner.get("message_type").and_then(|v| v.as_str()) {
        Some(tag) => MessageKind::from_tag(tag),
        None => {
            tracing::debug!("routing log record has no message_type");
            env.kind.clone()
        }
    };
    let value = match inner.get("value") {
        Some(serde_json::Value::String(s)) => Value::Text(s.clone()),
        Some(other) => Value::Record(other.clone()),
        // The outer value is this record itself, so there is nothing to fall back to.
        None => Value::Record(serde_json::Value::Null),
    };
    let timestamp = inner
        .get("timestamp")
        .and_then(|v| v.as_f64())
        .or(env.timestamp)
        .unwrap_or(now);
    let field = |name: &str, outer: &str| {
        inner
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| outer.to_string())
    };

    PendingEntry {
        timestamp,
        kind,
        emitter: field("emitter", &env.emitter),
        receiver: field("receiver", &env.receiver),
        value,
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
