//! Per-subscriber delta streams over the aggregator.
//!
//! Each subscriber polls on its own interval and keeps its own cursor (the
//! last delivered entry id) and the last roster it was sent. Nothing is
//! shared between subscribers except the aggregator itself.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::aggregator::{EventAggregator, HistoryEntry};
use crate::obs::metrics::DashboardMetrics;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One update pushed to a dashboard client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Delta {
    Clients { clients: Vec<String> },
    Message(HistoryEntry),
}

impl Delta {
    pub fn type_str(&self) -> &'static str {
        match self {
            Delta::Clients { .. } => "clients",
            Delta::Message(_) => "message",
        }
    }
}

#[derive(Clone)]
pub struct DeltaPublisher {
    aggregator: Arc<EventAggregator>,
    poll_interval: Duration,
    metrics: Option<Arc<DashboardMetrics>>,
}

impl DeltaPublisher {
    pub fn new(aggregator: Arc<EventAggregator>, poll_interval: Duration) -> Self {
        Self {
            aggregator,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<DashboardMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Lazy delta stream for one subscriber.
    ///
    /// The first tick fires one poll interval after the first poll of the
    /// stream. Dropping the stream stops polling.
    pub fn subscribe(&self) -> impl Stream<Item = Delta> + Send + 'static {
        let sub = Subscriber {
            aggregator: Arc::clone(&self.aggregator),
            period: self.poll_interval,
            ticker: None,
            cursor: 0,
            last_roster: Vec::new(),
            pending: VecDeque::new(),
            guard: self.metrics.clone().map(SubscriberGuard::new),
        };

        stream::unfold(sub, |mut sub| async move {
            let delta = sub.next_delta().await;
            Some((delta, sub))
        })
    }
}

struct Subscriber {
    aggregator: Arc<EventAggregator>,
    period: Duration,
    ticker: Option<Interval>,
    cursor: u64,
    last_roster: Vec<String>,
    pending: VecDeque<Delta>,
    guard: Option<SubscriberGuard>,
}

impl Subscriber {
    async fn next_delta(&mut self) -> Delta {
        loop {
            if let Some(delta) = self.pending.pop_front() {
                if let Some(g) = &self.guard {
                    g.metrics.deltas.inc(&[("type", delta.type_str())]);
                }
                return delta;
            }

            let period = self.period;
            let ticker = self.ticker.get_or_insert_with(|| {
                let mut t = interval_at(Instant::now() + period, period);
                t.set_missed_tick_behavior(MissedTickBehavior::Delay);
                t
            });
            ticker.tick().await;
            self.poll();
        }
    }

    fn poll(&mut self) {
        let snap = self.aggregator.snapshot_since(self.cursor);

        if snap.roster != self.last_roster {
            self.last_roster = snap.roster.clone();
            self.pending.push_back(Delta::Clients { clients: snap.roster });
        }

        if let Some(last) = snap.entries.last() {
            self.cursor = last.id;
        }
        self.pending.extend(snap.entries.into_iter().map(Delta::Message));
    }
}

/// Keeps the active-subscriber gauge in step with live streams.
struct SubscriberGuard {
    metrics: Arc<DashboardMetrics>,
}

impl SubscriberGuard {
    fn new(metrics: Arc<DashboardMetrics>) -> Self {
        metrics.sse_subscribers.inc(&[]);
        Self { metrics }
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.metrics.sse_subscribers.dec(&[]);
    }
}
