//! Record keys derived from block timestamps.

use chrono::DateTime;

/// ISO-8601 calendar date (UTC) for a unix timestamp in seconds.
///
/// Timestamps outside chrono's range fall back to the epoch date.
pub fn date_key(timestamp: u64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .unwrap_or_default()
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}
