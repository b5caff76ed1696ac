//! Score events and celebration triggers from the `cricket_score` topic.

use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::field::field;
use crate::types::{Record, Timestamp};

/// Record key carrying the celebration type.
pub const FIELD_SCORE_TYPE: &str = "type";

/// Optional record key carrying the current over, e.g. `"4.2"`.
pub const FIELD_OVERS: &str = "overs";

/// Display format for [`ScoreEvent::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScoreKind {
    Run,
    Wicket,
    Extra,
}

/// A single scoring event: runs, a wicket, or an extra.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreEvent {
    kind: ScoreKind,
    value: i64,
    overs: String,
    timestamp: String,
    auto_detected: bool,
}

impl ScoreEvent {
    pub fn new(
        kind: ScoreKind,
        value: i64,
        overs: impl Into<String>,
        timestamp: impl Into<String>,
        auto_detected: bool,
    ) -> Self {
        Self {
            kind,
            value,
            overs: overs.into(),
            timestamp: timestamp.into(),
            auto_detected,
        }
    }

    /// Construct an event stamped with `at`, formatted as [`TIMESTAMP_FORMAT`].
    pub fn at(
        kind: ScoreKind,
        value: i64,
        overs: impl Into<String>,
        at: Timestamp,
        auto_detected: bool,
    ) -> Self {
        Self::new(
            kind,
            value,
            overs,
            at.format(TIMESTAMP_FORMAT).to_string(),
            auto_detected,
        )
    }

    pub fn kind(&self) -> ScoreKind {
        self.kind
    }

    /// Number of runs, or the wicket/extra count.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Over in which the event occurred, e.g. `"4.2"`.
    pub fn overs(&self) -> &str {
        &self.overs
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Whether the event was inferred from sensors rather than entered.
    pub fn auto_detected(&self) -> bool {
        self.auto_detected
    }
}

// ---------------------------------------------------------------------------
// Celebration
// ---------------------------------------------------------------------------

/// A confirmed boundary or wicket pushed on the `cricket_score` topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Celebration {
    Six,
    Four,
    Wicket,
}

impl Celebration {
    /// Decode a `cricket_score` record.
    ///
    /// Returns `Ok(None)` when the record carries no `type` field.
    pub fn from_record(record: &Record) -> Result<Option<Self>, CoreError> {
        match field(record, FIELD_SCORE_TYPE) {
            None => Ok(None),
            Some(value) => match value.as_str() {
                Some(s) => s.parse().map(Some),
                None => Err(CoreError::UnknownScoreType(value.to_string())),
            },
        }
    }

    /// Text shown on the score card.
    pub fn label(self) -> &'static str {
        match self {
            Celebration::Six => "6",
            Celebration::Four => "4",
            Celebration::Wicket => "W",
        }
    }

    pub fn score_event(self, overs: impl Into<String>, at: Timestamp) -> ScoreEvent {
        let (kind, value) = match self {
            Celebration::Six => (ScoreKind::Run, 6),
            Celebration::Four => (ScoreKind::Run, 4),
            Celebration::Wicket => (ScoreKind::Wicket, 1),
        };
        ScoreEvent::at(kind, value, overs, at, false)
    }
}

/// Read the over a record refers to.
///
/// Strings are taken as-is and numbers are rendered with `Display`; anything
/// else, or a missing field, gives an empty string.
pub fn overs_from_record(record: &Record) -> String {
    match field(record, FIELD_OVERS) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

impl FromStr for Celebration {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIX" => Ok(Celebration::Six),
            "FOUR" => Ok(Celebration::Four),
            "WICKET" => Ok(Celebration::Wicket),
            other => Err(CoreError::UnknownScoreType(other.to_string())),
        }
    }
}
