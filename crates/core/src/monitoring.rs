//! Monitoring-window status and the countdown shown while it is open.
//!
//! [`MonitorDisplay`] is a plain state machine; it never schedules
//! anything itself. The caller drives it with [`MonitorDisplay::apply`]
//! for every `system` record and [`MonitorDisplay::tick`] once per
//! [`COUNTDOWN_STEP_MS`] while a countdown is running.

use serde::Serialize;

use crate::error::CoreError;
use crate::field::{decode_bool, decode_i64, field};
use crate::types::Record;

/// Record key for the monitoring flag.
pub const FIELD_MONITORING_ACTIVE: &str = "monitoring_active";
/// Record key for the time left in the monitoring window.
pub const FIELD_MONITORING_REMAINING_MS: &str = "monitoring_remaining_ms";

/// Countdown decrement per tick, in milliseconds.
pub const COUNTDOWN_STEP_MS: i64 = 100;

pub const STATUS_ACTIVE: &str = "MONITORING ACTIVE";
pub const STATUS_INACTIVE: &str = "MONITORING INACTIVE";

/// Countdown text shown when the remaining time could not be decoded.
pub const COUNTDOWN_ERROR_TEXT: &str = "Error";

// ---------------------------------------------------------------------------
// MonitoringState
// ---------------------------------------------------------------------------

/// A decoded `system` record.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringState {
    pub active: bool,
    /// Time left in the window. Only read when `active`; `None` when the
    /// record did not carry the field.
    pub remaining_ms: Option<Result<i64, CoreError>>,
}

impl MonitoringState {
    pub fn active(remaining_ms: i64) -> Self {
        Self {
            active: true,
            remaining_ms: Some(Ok(remaining_ms)),
        }
    }

    pub fn inactive() -> Self {
        Self {
            active: false,
            remaining_ms: None,
        }
    }

    /// Decode a `system` record.
    ///
    /// Returns `None` when the record has no boolean `monitoring_active`
    /// field; such records carry nothing the display reacts to.
    pub fn from_record(record: &Record) -> Option<Self> {
        let active = field(record, FIELD_MONITORING_ACTIVE).and_then(decode_bool)?;
        let remaining_ms = if active {
            field(record, FIELD_MONITORING_REMAINING_MS)
                .map(|v| decode_i64(FIELD_MONITORING_REMAINING_MS, v))
        } else {
            None
        };
        Some(Self {
            active,
            remaining_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// Countdown arithmetic
// ---------------------------------------------------------------------------

/// One countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountdownTick {
    pub display_seconds: f64,
    pub next_remaining_ms: i64,
}

impl CountdownTick {
    /// Whether the countdown should be rescheduled after this tick.
    pub fn should_continue(&self) -> bool {
        self.next_remaining_ms > 0
    }

    pub fn text(&self) -> String {
        format!("{:.1} sec remaining", self.display_seconds)
    }
}

/// Compute the value to display for `remaining_ms` and the remaining time
/// after one [`COUNTDOWN_STEP_MS`] step.
pub fn tick_countdown(remaining_ms: i64) -> CountdownTick {
    CountdownTick {
        display_seconds: remaining_ms as f64 / 1000.0,
        next_remaining_ms: remaining_ms.saturating_sub(COUNTDOWN_STEP_MS),
    }
}

// ---------------------------------------------------------------------------
// MonitorDisplay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CountdownState {
    #[default]
    Inactive,
    Active { remaining_ms: i64 },
}

/// What the caller must do with its countdown timer after a `system` update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorTransition {
    /// Cancel any running countdown and start a new one.
    StartCountdown { remaining_ms: i64 },
    /// Cancel any running countdown; the countdown text was cleared.
    StopCountdown,
    /// Cancel any running countdown; the remaining time was malformed.
    CountdownError,
    /// Only the status changed; leave the timer alone.
    StatusOnly,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MonitorDisplay {
    monitoring_active: bool,
    countdown: CountdownState,
    countdown_text: String,
}

impl MonitorDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.monitoring_active
    }

    pub fn countdown(&self) -> CountdownState {
        self.countdown
    }

    pub fn status_text(&self) -> &'static str {
        if self.monitoring_active {
            STATUS_ACTIVE
        } else {
            STATUS_INACTIVE
        }
    }

    pub fn countdown_text(&self) -> &str {
        &self.countdown_text
    }

    /// Apply a `system` update.
    pub fn apply(&mut self, state: &MonitoringState) -> MonitorTransition {
        self.monitoring_active = state.active;

        if !state.active {
            self.countdown = CountdownState::Inactive;
            self.countdown_text.clear();
            return MonitorTransition::StopCountdown;
        }

        match &state.remaining_ms {
            None => MonitorTransition::StatusOnly,
            Some(Ok(remaining_ms)) => {
                self.countdown = CountdownState::Active {
                    remaining_ms: *remaining_ms,
                };
                MonitorTransition::StartCountdown {
                    remaining_ms: *remaining_ms,
                }
            }
            Some(Err(_)) => {
                self.countdown = CountdownState::Inactive;
                self.countdown_text = COUNTDOWN_ERROR_TEXT.to_string();
                MonitorTransition::CountdownError
            }
        }
    }

    /// Advance a running countdown by one step.
    ///
    /// Returns `None` once monitoring is inactive or the countdown has
    /// finished; the caller stops rescheduling at that point, and also
    /// after any tick whose [`CountdownTick::should_continue`] is false.
    pub fn tick(&mut self) -> Option<CountdownTick> {
        let remaining_ms = match self.countdown {
            CountdownState::Active { remaining_ms } if self.monitoring_active => remaining_ms,
            _ => {
                self.countdown = CountdownState::Inactive;
                return None;
            }
        };

        let tick = tick_countdown(remaining_ms);
        self.countdown_text = tick.text();
        self.countdown = if tick.should_continue() {
            CountdownState::Active {
                remaining_ms: tick.next_remaining_ms,
            }
        } else {
            CountdownState::Inactive
        };
        Some(tick)
    }
}
