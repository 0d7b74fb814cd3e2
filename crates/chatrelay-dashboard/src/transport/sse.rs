//! `GET /stream`: server-sent delta events.
//!
//! Each connection gets its own publisher subscription. When the client goes
//! away axum drops the body stream, which ends the subscription.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{Stream, StreamExt};

use crate::app_state::AppState;
use crate::publisher::Delta;

pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("sse subscriber attached");
    let deltas = state.publisher().subscribe().filter_map(|d| async move { to_event(&d) });
    Sse::new(deltas.map(Ok)).keep_alive(KeepAlive::default())
}

fn to_event(delta: &Delta) -> Option<Event> {
    match Event::default().json_data(delta) {
        Ok(ev) => Some(ev),
        Err(e) => {
            tracing::warn!(error = %e, kind = delta.type_str(), "delta serialization failed");
            None
        }
    }
}
