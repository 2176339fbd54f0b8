use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::models::TickOutcome;
use crate::services::session_service::settle_locked;
use crate::services::AppState;

/// Spawns the countdown for a timed session. The task decrements the
/// session's remaining budget once per tick while it is still Testing and
/// auto-submits at zero through the same settle path the caller's submit
/// uses; submit idempotence makes a racing manual submit harmless. The task
/// stops on its own when the session leaves Testing or disappears, and its
/// handle is aborted on every other exit path.
pub fn spawn_countdown(state: Arc<AppState>, session_id: String) -> JoinHandle<()> {
    let interval = tick_interval_ms();
    tokio::spawn(async move {
        loop {
            sleep(Duration::from_millis(interval)).await;

            let mut sessions = state.sessions.write().await;
            let Some(entry) = sessions.get_mut(&session_id) else {
                break;
            };
            match entry.session.tick() {
                TickOutcome::Ticked(_) => {}
                TickOutcome::Expired(delta) => {
                    tracing::info!(session_id = %session_id, "Time budget exhausted, auto-submitting");
                    settle_locked(entry, delta);
                    break;
                }
                TickOutcome::Stopped => break,
            }
        }
    })
}

fn tick_interval_ms() -> u64 {
    std::env::var("TIMER_TICK_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(1000)
}
