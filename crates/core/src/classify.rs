//! Boundary event classification.
//!
//! Infers a probable game event from the three detection flags. Rules are
//! evaluated in order and the first match wins:
//!
//! | # | Condition                          | Event        |
//! |---|------------------------------------|--------------|
//! | 1 | foil ∧ ¬vibration ∧ ¬sound         | SIX          |
//! | 2 | vibration ∧ sound                  | FOUR         |
//! | 3 | vibration ∧ ¬sound                 | OUT          |
//!
//! Anything else (including foil together with sound but no vibration)
//! produces no event.

use serde::Serialize;

use crate::score::{ScoreEvent, ScoreKind};
use crate::sensor::DetectionSample;
use crate::types::Timestamp;

pub const SIX_MESSAGE: &str = "Possible SIX RUNS: Player caught ball on boundary!";
pub const SIX_COLOR: &str = "#FF5722";

pub const FOUR_MESSAGE: &str = "Possible FOUR RUNS: Ball hit boundary rope!";
pub const FOUR_COLOR: &str = "#2196F3";

pub const OUT_MESSAGE: &str = "Possible OUT: Player touched boundary!";
pub const OUT_COLOR: &str = "#F44336";

/// A user-facing notification with its card colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEvent {
    pub message: String,
    pub severity_color: String,
}

/// The game event a detection sample most likely corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectedEvent {
    Six,
    Four,
    Out,
}

impl DetectedEvent {
    pub fn message(self) -> &'static str {
        match self {
            DetectedEvent::Six => SIX_MESSAGE,
            DetectedEvent::Four => FOUR_MESSAGE,
            DetectedEvent::Out => OUT_MESSAGE,
        }
    }

    pub fn severity_color(self) -> &'static str {
        match self {
            DetectedEvent::Six => SIX_COLOR,
            DetectedEvent::Four => FOUR_COLOR,
            DetectedEvent::Out => OUT_COLOR,
        }
    }

    pub fn notification(self) -> NotificationEvent {
        NotificationEvent {
            message: self.message().to_string(),
            severity_color: self.severity_color().to_string(),
        }
    }

    /// Build the auto-detected score event this outcome would record.
    pub fn score_event(self, overs: impl Into<String>, at: Timestamp) -> ScoreEvent {
        let (kind, value) = match self {
            DetectedEvent::Six => (ScoreKind::Run, 6),
            DetectedEvent::Four => (ScoreKind::Run, 4),
            DetectedEvent::Out => (ScoreKind::Wicket, 1),
        };
        ScoreEvent::at(kind, value, overs, at, true)
    }
}

/// Apply the rule table to a detection sample.
pub fn classify_event(detection: &DetectionSample) -> Option<DetectedEvent> {
    let DetectionSample {
        foil_contact: foil,
        vibration_detected: vibration,
        sound_detected: sound,
    } = *detection;

    if foil && !vibration && !sound {
        Some(DetectedEvent::Six)
    } else if vibration && sound {
        Some(DetectedEvent::Four)
    } else if vibration && !sound {
        Some(DetectedEvent::Out)
    } else {
        None
    }
}

/// Classify a detection sample into a notification, if any rule matches.
pub fn classify(detection: &DetectionSample) -> Option<NotificationEvent> {
    classify_event(detection).map(DetectedEvent::notification)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn all_samples() -> impl Iterator<Item = DetectionSample> {
        (0u8..8).map(|bits| DetectionSample::new(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0))
    }

    #[test]
    fn foil_only_is_six() {
        let event = classify(&DetectionSample::new(true, false, false)).unwrap();
        assert_eq!(event.message, "Possible SIX RUNS: Player caught ball on boundary!");
        assert_eq!(event.severity_color, "#FF5722");
    }

    #[test]
    fn vibration_and_sound_is_four() {
        let event = classify(&DetectionSample::new(false, true, true)).unwrap();
        assert_eq!(event.message, "Possible FOUR RUNS: Ball hit boundary rope!");
        assert_eq!(event.severity_color, "#2196F3");
    }

    #[test]
    fn vibration_without_sound_is_out() {
        let event = classify(&DetectionSample::new(false, true, false)).unwrap();
        assert_eq!(event.message, OUT_MESSAGE);
        assert_eq!(event.severity_color, "#F44336");
    }

    #[test]
    fn foil_does_not_override_later_rules() {
        assert_eq!(
            classify_event(&DetectionSample::new(true, true, true)),
            Some(DetectedEvent::Four)
        );
        assert_eq!(
            classify_event(&DetectionSample::new(true, true, false)),
            Some(DetectedEvent::Out)
        );
    }

    #[test]
    fn unmatched_samples_produce_nothing() {
        assert!(classify(&DetectionSample::default()).is_none());
        assert!(classify(&DetectionSample::new(false, false, true)).is_none());
        assert!(classify(&DetectionSample::new(true, false, true)).is_none());
    }

    #[test]
    fn rule_table_is_exhaustive_over_all_inputs() {
        for sample in all_samples() {
            let expected = match (
                sample.foil_contact,
                sample.vibration_detected,
                sample.sound_detected,
            ) {
                (true, false, false) => Some(DetectedEvent::Six),
                (_, true, true) => Some(DetectedEvent::Four),
                (_, true, false) => Some(DetectedEvent::Out),
                _ => None,
            };
            assert_eq!(classify_event(&sample), expected, "sample {sample:?}");
        }
    }

    #[test]
    fn detected_events_map_to_auto_scores() {
        let at = Utc.with_ymd_and_hms(2026, 5, 2, 12, 0, 0).unwrap();
        let six = DetectedEvent::Six.score_event("4.2", at);
        assert_eq!(six.kind(), ScoreKind::Run);
        assert_eq!(six.value(), 6);
        assert_eq!(six.overs(), "4.2");
        assert_eq!(six.timestamp(), "12:00:00");
        assert!(six.auto_detected());

        let out = DetectedEvent::Out.score_event("4.3", at);
        assert_eq!(out.kind(), ScoreKind::Wicket);
        assert_eq!(out.value(), 1);
    }
}
