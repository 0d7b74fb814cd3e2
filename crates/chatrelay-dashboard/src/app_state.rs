//! Shared application state for the dashboard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::aggregator::EventAggregator;
use crate::config::DashboardConfig;
use crate::obs::metrics::DashboardMetrics;
use crate::publisher::DeltaPublisher;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: DashboardConfig,
    aggregator: Arc<EventAggregator>,
    publisher: DeltaPublisher,
    metrics: Arc<DashboardMetrics>,
    upstream_ready: AtomicBool,
}

impl AppState {
    pub fn new(cfg: DashboardConfig) -> Self {
        let aggregator = Arc::new(
            EventAggregator::new(cfg.dashboard.history_capacity)
                .with_observer_prefix(cfg.upstream.username.clone()),
        );
        let metrics = Arc::new(DashboardMetrics::default());
        let publisher = DeltaPublisher::new(Arc::clone(&aggregator), cfg.dashboard.poll_interval())
            .with_metrics(Arc::clone(&metrics));

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                aggregator,
                publisher,
                metrics,
                upstream_ready: AtomicBool::new(false),
            }),
        }
    }

    pub fn cfg(&self) -> &DashboardConfig {
        &self.inner.cfg
    }

    pub fn aggregator(&self) -> Arc<EventAggregator> {
        Arc::clone(&self.inner.aggregator)
    }

    pub fn publisher(&self) -> &DeltaPublisher {
        &self.inner.publisher
    }

    pub fn metrics(&self) -> &DashboardMetrics {
        &self.inner.metrics
    }

    pub fn set_upstream_ready(&self, ready: bool) {
        self.inner.upstream_ready.store(ready, Ordering::Relaxed);
    }

    pub fn is_upstream_ready(&self) -> bool {
        self.inner.upstream_ready.load(Ordering::Relaxed)
    }

    /// Gauges sampled at scrape time.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let agg = &self.inner.aggregator;
        vec![
            ("chatrelay_history_evictions_total", agg.evicted_total()),
            ("chatrelay_history_len", agg.len() as u64),
            ("chatrelay_roster_size", agg.roster().len() as u64),
            ("chatrelay_upstream_ready", u64::from(self.is_upstream_ready())),
        ]
    }
}
