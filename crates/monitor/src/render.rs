//! Rendering of interpreter outputs for stdout.

use boundvision_events::InterpreterOutput;

use crate::config::OutputFormat;

pub fn render(output: &InterpreterOutput, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string(output),
        OutputFormat::Text => Ok(render_text(output)),
    }
}

fn mark(alert: bool) -> &'static str {
    if alert {
        "!"
    } else {
        ""
    }
}

fn lit(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

fn render_text(output: &InterpreterOutput) -> String {
    match output {
        InterpreterOutput::SensorDisplay(d) => format!(
            "sensor    distance={}{} sound={}{} vibration={}{} foil={}{}",
            d.distance.text,
            mark(d.distance.alert),
            d.sound.text,
            mark(d.sound.alert),
            d.vibration.text,
            mark(d.vibration.alert),
            d.foil_contact.text,
            mark(d.foil_contact.alert),
        ),
        InterpreterOutput::Indicators(i) => format!(
            "detect    foil={} vibration={} sound={}",
            lit(i.foil),
            lit(i.vibration),
            lit(i.sound)
        ),
        InterpreterOutput::Notification { notification, .. } => format!(
            "notify    [{}] {}",
            notification.severity_color, notification.message
        ),
        InterpreterOutput::NotificationDismissed => "notify    dismissed".to_string(),
        InterpreterOutput::MonitoringStatus { text, .. } => format!("status    {text}"),
        InterpreterOutput::Countdown { text, .. } => format!("countdown {text}"),
        InterpreterOutput::CountdownCleared => "countdown cleared".to_string(),
        InterpreterOutput::CountdownError { text } => format!("countdown {text}"),
        InterpreterOutput::Celebration { label, score, .. } if !score.overs().is_empty() => {
            format!("score     {label} (over {})", score.overs())
        }
        InterpreterOutput::Celebration { label, .. } => format!("score     {label}"),
    }
}

#[cfg(test)]
mod tests {
    use boundvision_core::{Celebration, DetectedEvent, ScoreEvent, ScoreKind};

    use super::*;

    #[test]
    fn text_notification_includes_colour() {
        let output = InterpreterOutput::Notification {
            event: DetectedEvent::Out,
            notification: DetectedEvent::Out.notification(),
            score: ScoreEvent::new(ScoreKind::Wicket, 1, "", "09:00:00", true),
        };
        assert_eq!(
            render(&output, OutputFormat::Text).unwrap(),
            "notify    [#F44336] Possible OUT: Player touched boundary!"
        );
    }

    #[test]
    fn json_output_is_tagged() {
        let output = InterpreterOutput::Celebration {
            celebration: Celebration::Four,
            label: "4".into(),
            score: ScoreEvent::new(ScoreKind::Run, 4, "2.5", "10:00:00", false),
        };
        let line = render(&output, OutputFormat::Json).unwrap();
        assert_eq!(
            line,
            r#"{"kind":"celebration","celebration":"FOUR","label":"4","score":{"kind":"RUN","value":4,"overs":"2.5","timestamp":"10:00:00","auto_detected":false}}"#
        );
    }

    #[test]
    fn text_celebration_shows_over_when_known() {
        let with_over = InterpreterOutput::Celebration {
            celebration: Celebration::Six,
            label: "6".into(),
            score: ScoreEvent::new(ScoreKind::Run, 6, "7.1", "10:00:00", false),
        };
        let without = InterpreterOutput::Celebration {
            celebration: Celebration::Six,
            label: "6".into(),
            score: ScoreEvent::new(ScoreKind::Run, 6, "", "10:00:00", false),
        };
        assert_eq!(render_text(&with_over), "score     6 (over 7.1)");
        assert_eq!(render_text(&without), "score     6");
    }
}
