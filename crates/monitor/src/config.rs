use std::str::FromStr;
use std::time::Duration;

use boundvision_events::bus::DEFAULT_CAPACITY;
use boundvision_events::interpreter::DEFAULT_NOTIFICATION_DISPLAY;
use boundvision_events::InterpreterConfig;

/// Default upper bound on waiting for timers to settle after the feed ends.
pub const DEFAULT_EOF_LINGER: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// How interpreter outputs are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    Text,
}

impl FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            _ => Err(()),
        }
    }
}

/// Monitor configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay before a notification is dismissed.
    pub notification_display: Duration,
    /// Broadcast capacity of the feed bus.
    pub feed_capacity: usize,
    /// Rendering of interpreter outputs.
    pub output_format: OutputFormat,
    /// Emit log lines as JSON instead of plain text.
    pub json_logs: bool,
    /// How long to let a running countdown or shown notification finish
    /// after stdin closes. Zero stops immediately.
    pub eof_linger: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            notification_display: DEFAULT_NOTIFICATION_DISPLAY,
            feed_capacity: DEFAULT_CAPACITY,
            output_format: OutputFormat::Json,
            json_logs: false,
            eof_linger: DEFAULT_EOF_LINGER,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `NOTIFICATION_DISPLAY_MS` | `4000`  |
    /// | `FEED_CHANNEL_CAPACITY`   | `1024`  |
    /// | `OUTPUT_FORMAT`           | `json`  |
    /// | `LOG_FORMAT`              | `text`  |
    /// | `EOF_LINGER_MS`           | `30000` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("NOTIFICATION_DISPLAY_MS") {
            config.notification_display = parse_millis("NOTIFICATION_DISPLAY_MS", &value)?;
        }

        if let Some(value) = lookup("EOF_LINGER_MS") {
            config.eof_linger = parse_millis("EOF_LINGER_MS", &value)?;
        }

        if let Some(value) = lookup("FEED_CHANNEL_CAPACITY") {
            config.feed_capacity = value
                .trim()
                .parse()
                .ok()
                .filter(|&n: &usize| n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "FEED_CHANNEL_CAPACITY",
                    expected: "a positive integer",
                    value: value.clone(),
                })?;
        }

        if let Some(value) = lookup("OUTPUT_FORMAT") {
            config.output_format = value.parse().map_err(|_| ConfigError::Invalid {
                var: "OUTPUT_FORMAT",
                expected: "`json` or `text`",
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("LOG_FORMAT") {
            config.json_logs = match value.parse() {
                Ok(OutputFormat::Json) => true,
                Ok(OutputFormat::Text) => false,
                Err(()) => {
                    return Err(ConfigError::Invalid {
                        var: "LOG_FORMAT",
                        expected: "`json` or `text`",
                        value,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn interpreter(&self) -> InterpreterConfig {
        InterpreterConfig {
            notification_display: self.notification_display,
            ..InterpreterConfig::default()
        }
    }
}

fn parse_millis(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::Invalid {
            var,
            expected: "a number of milliseconds",
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<MonitorConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MonitorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.notification_display, Duration::from_millis(4000));
        assert_eq!(config.feed_capacity, 1024);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(!config.json_logs);
        assert_eq!(config.eof_linger, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("NOTIFICATION_DISPLAY_MS", "1500"),
            ("FEED_CHANNEL_CAPACITY", "64"),
            ("OUTPUT_FORMAT", "Text"),
            ("LOG_FORMAT", "json"),
            ("EOF_LINGER_MS", "0"),
        ])
        .unwrap();
        assert_eq!(config.notification_display, Duration::from_millis(1500));
        assert_eq!(config.feed_capacity, 64);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert!(config.json_logs);
        assert!(config.eof_linger.is_zero());
        assert_eq!(
            config.interpreter().notification_display,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_matches!(
            load(&[("FEED_CHANNEL_CAPACITY", "0")]),
            Err(ConfigError::Invalid { var: "FEED_CHANNEL_CAPACITY", .. })
        );
    }

    #[test]
    fn negative_linger_is_rejected() {
        assert_matches!(
            load(&[("EOF_LINGER_MS", "-1")]),
            Err(ConfigError::Invalid { var: "EOF_LINGER_MS", .. })
        );
    }

    #[test]
    fn unknown_output_format_is_rejected() {
        let err = load(&[("OUTPUT_FORMAT", "xml")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "OUTPUT_FORMAT must be `json` or `text`, got \"xml\""
        );
    }
}
