use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use chatrelay_client::config::UpstreamConfig;
use chatrelay_client::ClientOptions;
use chatrelay_core::error::{RelayError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    pub version: u32,

    #[serde(default)]
    pub upstream: AdminUpstream,

    #[serde(default)]
    pub dashboard: DashboardSection,
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::UnsupportedVersion);
        }
        self.upstream.validate()?;
        self.dashboard.validate()?;
        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version: 1,
            upstream: AdminUpstream::default(),
            dashboard: DashboardSection::default(),
        }
    }
}

/// Observer connection to the routing server.
///
/// Same shape as the chat client's `upstream`, but declares as `ADMIN` by
/// default so the server routes admin notifications to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminUpstream {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

impl Default for AdminUpstream {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl AdminUpstream {
    fn as_client_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            url: self.url.clone(),
            username: self.username.clone(),
            send_timeout_ms: self.send_timeout_ms,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.as_client_config().validate()
    }

    pub fn client_options(&self) -> ClientOptions {
        self.as_client_config().client_options()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// 0 disables reconnection.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            poll_interval_ms: default_poll_interval_ms(),
            history_capacity: default_history_capacity(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl DashboardSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(RelayError::BadConfig(format!(
                "dashboard.listen is not a socket address: {}",
                self.listen
            )));
        }
        if !(50..=10000).contains(&self.poll_interval_ms) {
            return Err(RelayError::BadConfig(
                "dashboard.poll_interval_ms must be between 50 and 10000".into(),
            ));
        }
        if !(1..=100_000).contains(&self.history_capacity) {
            return Err(RelayError::BadConfig(
                "dashboard.history_capacity must be between 1 and 100000".into(),
            ));
        }
        if self.reconnect_delay_ms != 0 && !(100..=600_000).contains(&self.reconnect_delay_ms) {
            return Err(RelayError::BadConfig(
                "dashboard.reconnect_delay_ms must be 0 or between 100 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Option<Duration> {
        (self.reconnect_delay_ms > 0).then(|| Duration::from_millis(self.reconnect_delay_ms))
    }
}

fn default_url() -> String {
    "ws://127.0.0.1:8765".into()
}
fn default_username() -> String {
    "ADMIN".into()
}
fn default_send_timeout_ms() -> u64 {
    5000
}
fn default_listen() -> String {
    "127.0.0.1:5001".into()
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_history_capacity() -> usize {
    500
}
fn default_reconnect_delay_ms() -> u64 {
    3000
}
