use chrono::{DateTime, Utc};

/// Ollama's timestamp layout: UTC with microsecond precision and a `Z` suffix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Current instant formatted as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn format_timestamp() -> String {
    format_timestamp_at(Utc::now())
}

pub fn format_timestamp_at(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
