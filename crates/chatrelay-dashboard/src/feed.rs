//! Admin feed: the dashboard's own connection to the routing server.
//!
//! Declares as the observer, pipes every inbound envelope into the
//! aggregator and flips readiness with the connection state. Reconnection is
//! a policy of this supervisor; the client itself never retries.

use tokio::sync::mpsc;

use chatrelay_client::{ClientEvent, RelayClient};

use crate::app_state::AppState;

pub struct AdminFeed {
    state: AppState,
}

impl AdminFeed {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Connect, pump, and reconnect until reconnection is disabled.
    pub async fn run(self) {
        let upstream = self.state.cfg().upstream.clone();
        let reconnect = self.state.cfg().dashboard.reconnect_delay();

        loop {
            let client = RelayClient::with_options(upstream.username.clone(), upstream.client_options());
            match client.connect(&upstream.url).await {
                Ok(events) => {
                    self.state.metrics().upstream_connects.inc(&[("outcome", "ok")]);
                    self.pump(&client, events).await;
                }
                Err(e) => {
                    self.state.metrics().upstream_connects.inc(&[("outcome", "error")]);
                    tracing::warn!(url = %upstream.url, code = e.code().as_str(), error = %e, "admin connect failed");
                }
            }
            self.state.set_upstream_ready(false);

            let Some(delay) = reconnect else {
                tracing::info!("admin feed stopped, reconnection disabled");
                return;
            };
            tracing::info!(delay_ms = delay.as_millis() as u64, "admin feed reconnecting");
            tokio::time::sleep(delay).await;
        }
    }

    /// Drain one connection's events into the aggregator. Returns after `Closed`.
    pub async fn pump(&self, client: &RelayClient, mut events: mpsc::Receiver<ClientEvent>) {
        let aggregator = self.state.aggregator();

        while let Some(ev) = events.recv().await {
            match ev {
                ClientEvent::Opened => {
                    self.state.set_upstream_ready(true);
                    tracing::info!(user = %client.username(), "admin feed active");
                    if let Err(e) = client.request_client_list().await {
                        tracing::debug!(error = %e, "initial client list request failed");
                    }
                }
                ClientEvent::Message(env) => {
                    let outcome = aggregator.ingest(&env);
                    self.state.metrics().envelopes.inc(&[("outcome", outcome.as_str())]);
                    tracing::trace!(kind = %env.kind.tag(), outcome = outcome.as_str(), "ingested");
                }
                // The aggregator keeps placeholders only; decoded bytes are not needed.
                ClientEvent::Media { .. } => {}
                ClientEvent::Error(e) => tracing::warn!(error = %e, "admin feed transport error"),
                ClientEvent::Closed { code, reason } => {
                    self.state.set_upstream_ready(false);
                    tracing::info!(?code, %reason, "admin feed closed");
                    break;
                }
            }
        }
    }
}

/// Start the feed on its own task.
pub fn spawn(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(AdminFeed::new(state).run())
}
