//! Rendering of raw sensor readings into display text and alert flags.

use serde::Serialize;

use crate::sensor::{SensorSample, SensorUpdate};

/// Distances strictly below this many centimetres raise an alert.
pub const DISTANCE_ALERT_CM: f64 = 15.0;

/// Sound levels strictly above this value raise an alert.
pub const SOUND_ALERT_LEVEL: i64 = 1000;

/// Text shown for a malformed distance reading.
pub const DISTANCE_SENTINEL: &str = "N/A cm";

/// Text shown for a malformed sound reading.
pub const SOUND_SENTINEL: &str = "N/A";

/// Text shown before a field has ever been received.
pub const PLACEHOLDER: &str = "--";

/// One rendered reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDisplay {
    pub text: String,
    pub alert: bool,
}

impl FieldDisplay {
    fn new(text: impl Into<String>, alert: bool) -> Self {
        Self {
            text: text.into(),
            alert,
        }
    }
}

impl Default for FieldDisplay {
    fn default() -> Self {
        Self::new(PLACEHOLDER, false)
    }
}

/// Rendered state of all four sensor readings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DisplayFields {
    pub distance: FieldDisplay,
    pub sound: FieldDisplay,
    pub vibration: FieldDisplay,
    pub foil_contact: FieldDisplay,
}

impl DisplayFields {
    /// Merge a partial update into the current display.
    ///
    /// Absent fields are left untouched; malformed numbers become the
    /// sentinel text with no alert.
    pub fn apply(&mut self, update: &SensorUpdate) {
        if let Some(distance) = &update.distance_cm {
            self.distance = match distance {
                Ok(cm) => render_distance(*cm),
                Err(_) => FieldDisplay::new(DISTANCE_SENTINEL, false),
            };
        }
        if let Some(sound) = &update.sound_level {
            self.sound = match sound {
                Ok(level) => render_sound(*level),
                Err(_) => FieldDisplay::new(SOUND_SENTINEL, false),
            };
        }
        if let Some(active) = update.vibration_active {
            self.vibration = render_vibration(active);
        }
        if let Some(contact) = update.foil_contact {
            self.foil_contact = render_foil(contact);
        }
    }
}

/// Render a complete sample.
pub fn format_sample(sample: &SensorSample) -> DisplayFields {
    let mut fields = DisplayFields::default();
    fields.apply(&SensorUpdate::from(sample));
    fields
}

fn render_distance(cm: f64) -> FieldDisplay {
    FieldDisplay::new(format!("{cm:.1} cm"), cm < DISTANCE_ALERT_CM)
}

fn render_sound(level: i64) -> FieldDisplay {
    FieldDisplay::new(level.to_string(), level > SOUND_ALERT_LEVEL)
}

fn render_vibration(active: bool) -> FieldDisplay {
    FieldDisplay::new(if active { "ACTIVE" } else { "Inactive" }, active)
}

fn render_foil(contact: bool) -> FieldDisplay {
    FieldDisplay::new(if contact { "CONTACT" } else { "No Contact" }, contact)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::CoreError;

    fn sample(distance_cm: f64, sound_level: i64) -> SensorSample {
        SensorSample {
            distance_cm,
            sound_level,
            vibration_active: false,
            foil_contact: false,
        }
    }

    #[test]
    fn distance_alert_is_strictly_below_fifteen() {
        assert!(format_sample(&sample(14.9, 0)).distance.alert);
        assert!(!format_sample(&sample(15.0, 0)).distance.alert);
    }

    #[test]
    fn sound_alert_is_strictly_above_one_thousand() {
        assert!(format_sample(&sample(100.0, 1001)).sound.alert);
        assert!(!format_sample(&sample(100.0, 1000)).sound.alert);
    }

    #[test]
    fn renders_all_fields() {
        let fields = format_sample(&SensorSample {
            distance_cm: 12.345,
            sound_level: 640,
            vibration_active: true,
            foil_contact: false,
        });
        assert_eq!(fields.distance.text, "12.3 cm");
        assert_eq!(fields.sound.text, "640");
        assert_eq!(fields.vibration, FieldDisplay::new("ACTIVE", true));
        assert_eq!(fields.foil_contact, FieldDisplay::new("No Contact", false));
    }

    #[test]
    fn malformed_numbers_render_sentinels() {
        let mut fields = format_sample(&sample(10.0, 2000));
        fields.apply(&SensorUpdate {
            distance_cm: Some(Err(CoreError::invalid_field("distance", "far"))),
            sound_level: Some(Err(CoreError::invalid_field("sound", "loud"))),
            ..Default::default()
        });
        assert_eq!(fields.distance, FieldDisplay::new("N/A cm", false));
        assert_eq!(fields.sound, FieldDisplay::new("N/A", false));
    }

    #[test]
    fn missing_fields_keep_previous_values() {
        let mut fields = format_sample(&sample(20.0, 300));
        let update = SensorUpdate::from_record(json!({"foil_contact": true}).as_object().unwrap());
        fields.apply(&update);

        assert_eq!(fields.distance.text, "20.0 cm");
        assert_eq!(fields.sound.text, "300");
        assert_eq!(fields.foil_contact, FieldDisplay::new("CONTACT", true));
    }

    #[test]
    fn fresh_display_shows_placeholders() {
        let fields = DisplayFields::default();
        assert_eq!(fields.distance.text, PLACEHOLDER);
        assert!(!fields.vibration.alert);
    }
}
