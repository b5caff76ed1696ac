//! Sensor and detection samples decoded from the `sensor` and `detection`
//! topics.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::field::{decode_bool, decode_f64, decode_i64, field, flag};
use crate::types::Record;

/// Record key for the ultrasonic distance reading, in centimetres.
pub const FIELD_DISTANCE: &str = "distance";
/// Record key for the microphone level (raw ADC units).
pub const FIELD_SOUND: &str = "sound";
/// Record key for the vibration sensor flag.
pub const FIELD_VIBRATION: &str = "vibration";
/// Record key for the boundary foil contact flag.
pub const FIELD_FOIL_CONTACT: &str = "foil_contact";

// ---------------------------------------------------------------------------
// SensorSample
// ---------------------------------------------------------------------------

/// The latest complete set of raw sensor readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub distance_cm: f64,
    pub sound_level: i64,
    pub vibration_active: bool,
    pub foil_contact: bool,
}

/// A partially-populated `sensor` record.
///
/// `None` means the field was absent from the snapshot and the displayed
/// value must stay as it was. `Some(Err(_))` means the field was present
/// but could not be decoded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorUpdate {
    pub distance_cm: Option<Result<f64, CoreError>>,
    pub sound_level: Option<Result<i64, CoreError>>,
    pub vibration_active: Option<bool>,
    pub foil_contact: Option<bool>,
}

impl SensorUpdate {
    /// Decode a `sensor` record.
    ///
    /// Boolean fields holding a non-boolean value are treated as absent.
    pub fn from_record(record: &Record) -> Self {
        Self {
            distance_cm: field(record, FIELD_DISTANCE).map(|v| decode_f64(FIELD_DISTANCE, v)),
            sound_level: field(record, FIELD_SOUND).map(|v| decode_i64(FIELD_SOUND, v)),
            vibration_active: field(record, FIELD_VIBRATION).and_then(decode_bool),
            foil_contact: field(record, FIELD_FOIL_CONTACT).and_then(decode_bool),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.distance_cm.is_none()
            && self.sound_level.is_none()
            && self.vibration_active.is_none()
            && self.foil_contact.is_none()
    }
}

impl From<&SensorSample> for SensorUpdate {
    fn from(sample: &SensorSample) -> Self {
        Self {
            distance_cm: Some(Ok(sample.distance_cm)),
            sound_level: Some(Ok(sample.sound_level)),
            vibration_active: Some(sample.vibration_active),
            foil_contact: Some(sample.foil_contact),
        }
    }
}

// ---------------------------------------------------------------------------
// DetectionSample
// ---------------------------------------------------------------------------

/// Boolean detection flags used for event classification.
///
/// Updated independently of [`SensorSample`]; the two are not required to
/// agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectionSample {
    pub foil_contact: bool,
    pub vibration_detected: bool,
    pub sound_detected: bool,
}

impl DetectionSample {
    pub fn new(foil_contact: bool, vibration_detected: bool, sound_detected: bool) -> Self {
        Self {
            foil_contact,
            vibration_detected,
            sound_detected,
        }
    }

    /// Decode a `detection` record. Missing or non-boolean flags read as `false`.
    pub fn from_record(record: &Record) -> Self {
        Self {
            foil_contact: flag(record, FIELD_FOIL_CONTACT),
            vibration_detected: flag(record, FIELD_VIBRATION),
            sound_detected: flag(record, FIELD_SOUND),
        }
    }
}

/// Per-sensor lit/unlit state shown alongside the notification card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DetectionIndicators {
    pub foil: bool,
    pub vibration: bool,
    pub sound: bool,
}

impl From<&DetectionSample> for DetectionIndicators {
    fn from(sample: &DetectionSample) -> Self {
        Self {
            foil: sample.foil_contact,
            vibration: sample.vibration_detected,
            sound: sample.sound_detected,
        }
    }
}
