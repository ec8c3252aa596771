/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Current time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds back into a [`Timestamp`].
///
/// Returns `None` for values outside chrono's representable range.
pub fn from_millis(millis: i64) -> Option<Timestamp> {
    chrono::DateTime::from_timestamp_millis(millis)
}
