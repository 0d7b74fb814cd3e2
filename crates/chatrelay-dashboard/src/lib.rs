//! chatrelay observer dashboard.
//!
//! Connects to the routing server as an administrative observer, aggregates
//! roster and routed-message events into a bounded history, and streams
//! incremental deltas to browsers over SSE.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod aggregator;
pub mod app_state;
pub mod config;
pub mod feed;
pub mod obs;
pub mod ops;
pub mod publisher;
pub mod router;
pub mod transport;
