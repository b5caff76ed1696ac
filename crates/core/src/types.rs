/// A decoded `{field: value}` snapshot as delivered by the realtime feed.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// All wall-clock timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
