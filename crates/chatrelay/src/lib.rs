//! Top-level facade crate for chatrelay.
//!
//! Re-exports the protocol core, the client, and the dashboard library so
//! users can depend on a single crate.

pub mod core {
    pub use chatrelay_core::*;
}

pub mod client {
    pub use chatrelay_client::*;
}

pub mod dashboard {
    pub use chatrelay_dashboard::*;
}

pub use chatrelay_client::{ClientEvent, RelayClient};
pub use chatrelay_core::protocol::Envelope;
pub use chatrelay_core::{RelayError, Result};
