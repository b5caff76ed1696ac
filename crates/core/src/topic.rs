//! Names of the update streams pushed by the realtime feed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Live sensor readings (distance, sound level, vibration, foil contact).
pub const TOPIC_SENSOR: &str = "sensor";

/// Monitoring-window status and remaining time.
pub const TOPIC_SYSTEM: &str = "system";

/// Boolean detection flags used for event classification.
pub const TOPIC_DETECTION: &str = "detection";

/// Confirmed score events that trigger a celebration.
pub const TOPIC_CRICKET_SCORE: &str = "cricket_score";

/// One of the independent update streams the interpreter listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Sensor,
    System,
    Detection,
    CricketScore,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::Sensor,
        Topic::System,
        Topic::Detection,
        Topic::CricketScore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Sensor => TOPIC_SENSOR,
            Topic::System => TOPIC_SYSTEM,
            Topic::Detection => TOPIC_DETECTION,
            Topic::CricketScore => TOPIC_CRICKET_SCORE,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            TOPIC_SENSOR => Ok(Topic::Sensor),
            TOPIC_SYSTEM => Ok(Topic::System),
            TOPIC_DETECTION => Ok(Topic::Detection),
            TOPIC_CRICKET_SCORE => Ok(Topic::CricketScore),
            other => Err(CoreError::UnknownTopic(other.to_string())),
        }
    }
}
