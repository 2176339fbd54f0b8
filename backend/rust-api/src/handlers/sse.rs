use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::{
    models::{timer::CountdownEvent, ViewState},
    services::AppState,
};

/// SSE endpoint for countdown events on a timed session
/// GET /api/v1/sessions/{id}/stream
pub async fn session_stream(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!("Client connected to SSE stream: session={}", session_id);

    let total_seconds = {
        let sessions = state.sessions.read().await;
        let entry = sessions
            .get(&session_id)
            .ok_or((StatusCode::NOT_FOUND, "Session not found".to_string()))?;
        entry.session.budget_seconds().ok_or((
            StatusCode::NOT_FOUND,
            "Session is not timed".to_string(),
        ))?
    };

    let tick_interval = tick_interval_ms();
    tracing::info!(
        "Starting SSE stream: session={}, budget={}s, tick_interval={}ms",
        session_id,
        total_seconds,
        tick_interval
    );
    let stream = create_countdown_stream(state, session_id, total_seconds, tick_interval);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn tick_interval_ms() -> u64 {
    std::env::var("SSE_TICK_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(1000)
}

/// Streams the live countdown state of the session. The stream does not run
/// its own clock; it reads whatever the countdown task last wrote, emits one
/// `time-expired` event if the budget ran out, and ends as soon as the
/// session leaves Testing or is discarded.
fn create_countdown_stream(
    state: Arc<AppState>,
    session_id: String,
    total_seconds: u32,
    tick_interval_ms: u64,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(false, move |final_sent| {
        let state = state.clone();
        let session_id = session_id.clone();
        async move {
            if final_sent {
                return None;
            }

            let observed = {
                let sessions = state.sessions.read().await;
                sessions.get(&session_id).map(|entry| {
                    (
                        entry.session.view(),
                        entry.session.is_timeout(),
                        entry.session.remaining_seconds().unwrap_or(0),
                    )
                })
            };

            let (view, is_timeout, remaining) = observed?;

            if is_timeout {
                let event = CountdownEvent::expired(&session_id);
                tracing::info!("Timer expired: session={}", session_id);
                let event = Event::default()
                    .event(event.event_name())
                    .data(event.to_sse_data());
                return Some((Ok(event), true));
            }

            if view != ViewState::Testing {
                // Settled manually; nothing left to stream.
                return None;
            }

            let tick = CountdownEvent::tick(&session_id, remaining, total_seconds);
            let event = Event::default()
                .event(tick.event_name())
                .data(tick.to_sse_data());

            sleep(Duration::from_millis(tick_interval_ms)).await;

            Some((Ok(event), false))
        }
    })
}
