//! Client config (strict YAML).

use std::fs;
use std::time::Duration;

use serde::Deserialize;

use chatrelay_core::error::{RelayError, Result};

use crate::client::ClientOptions;

/// Top-level config for the chat binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    pub version: u32,

    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl ChatConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::UnsupportedVersion);
        }
        self.upstream.validate()
    }
}

/// Where to connect and who to declare as.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(RelayError::BadConfig(
                "upstream.url must use ws:// or wss://".into(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(RelayError::BadConfig("upstream.username must not be empty".into()));
        }
        if !(100..=60000).contains(&self.send_timeout_ms) {
            return Err(RelayError::BadConfig(
                "upstream.send_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            send_timeout: Duration::from_millis(self.send_timeout_ms),
            ..ClientOptions::default()
        }
    }
}

fn default_url() -> String {
    "ws://127.0.0.1:8765".into()
}
fn default_username() -> String {
    "Client".into()
}
fn default_send_timeout_ms() -> u64 {
    5000
}

pub fn load_from_file(path: &str) -> Result<ChatConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| RelayError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ChatConfig> {
    let cfg: ChatConfig = serde_yaml::from_str(s)
        .map_err(|e| RelayError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
