use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events pushed over the session countdown stream.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CountdownEvent {
    TimerTick(TimerTick),
    TimeExpired(TimeExpired),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimerTick {
    pub session_id: String,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeExpired {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl CountdownEvent {
    pub fn tick(session_id: &str, remaining_seconds: u32, total_seconds: u32) -> Self {
        CountdownEvent::TimerTick(TimerTick {
            session_id: session_id.to_string(),
            remaining_seconds,
            total_seconds,
            timestamp: Utc::now(),
        })
    }

    pub fn expired(session_id: &str) -> Self {
        CountdownEvent::TimeExpired(TimeExpired {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
            message: "Time limit exceeded".to_string(),
        })
    }

    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            CountdownEvent::TimerTick(_) => "timer-tick",
            CountdownEvent::TimeExpired(_) => "time-expired",
        }
    }
}
