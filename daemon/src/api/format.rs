//! Engine output -> wire metrics.

use std::time::Duration;

/// Whole milliseconds, truncated.
pub fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Character count of prompt plus generated text. This is not a token count;
/// clients of this shim have always received the character-based figure.
pub fn eval_count(prompt: &str, generated: &str) -> u64 {
    (prompt.chars().count() + generated.chars().count()) as u64
}
