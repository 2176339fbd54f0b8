use serde_json::Value;

use crate::services::generation_service::GenerationError;

/// Recovers a JSON array of candidate question records from raw model text.
///
/// The collaborator is asked for a pure JSON array but in practice wraps the
/// payload in prose or markdown fences often enough that we cannot rely on
/// it. Two attempts: parse the trimmed text directly, then parse the slice
/// between the first `[` and the last `]`. A payload that survives neither
/// (typically truncated mid-array) is rejected wholesale; no partial repair.
pub fn extract_records(raw: &str) -> Result<Vec<Value>, GenerationError> {
    let trimmed = raw.trim();
    if let Ok(Value::Array(records)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(records);
    }

    if let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) {
        if start < end {
            if let Ok(Value::Array(records)) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return Ok(records);
            }
        }
    }

    tracing::warn!(
        length = raw.len(),
        "Could not recover a question array from generation response"
    );
    Err(GenerationError::Parse {
        raw: raw.to_string(),
    })
}
