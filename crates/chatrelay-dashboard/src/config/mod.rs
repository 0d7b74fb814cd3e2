//! Dashboard config loader (strict parsing).

pub mod schema;

use std::fs;

use chatrelay_core::error::{RelayError, Result};

pub use schema::{AdminUpstream, DashboardConfig, DashboardSection};

pub fn load_from_file(path: &str) -> Result<DashboardConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| RelayError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<DashboardConfig> {
    let cfg: DashboardConfig = serde_yaml::from_str(s)
        .map_err(|e| RelayError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
