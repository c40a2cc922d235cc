use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::SharedState;

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// GET /notices/history — most recent notices, newest first.
pub async fn history(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Json<serde_json::Value> {
    let entries = state.notices.history().await;
    let total = entries.len();
    let entries: Vec<_> = entries.into_iter().rev().take(query.limit).collect();

    Json(serde_json::json!({
        "notices": entries,
        "total": total,
        "limit": query.limit,
    }))
}

/// GET /notices/stream — SSE stream of notices as they are emitted.
pub async fn stream(
    State(state): State<SharedState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.notices.subscribe();
    let stream = BroadcastStream::new(rx);

    let event_stream = stream.filter_map(|result| {
        match result {
            Ok(notice) => {
                let data = serde_json::to_string(&notice).unwrap_or_default();
                Some(Ok(Event::default().event("notice").data(data)))
            }
            Err(_) => None, // Skip lagged messages
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
