//! Stateful sensor interpreter.
//!
//! [`SensorInterpreter`] consumes decoded feed records, keeps the rendered
//! sensor and monitoring state, and emits [`InterpreterOutput`]s on a
//! broadcast channel. It owns exactly two timers: the monitoring countdown
//! and the notification dismissal. Each lives in its own [`TimerSlot`], and
//! a generation counter makes ticks from a superseded timer no-ops.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use boundvision_core::monitoring::COUNTDOWN_STEP_MS;
use boundvision_core::{
    classify_event, overs_from_record, Celebration, CountdownState, CountdownTick,
    DetectedEvent, DetectionIndicators, DetectionSample, DisplayFields, MonitorDisplay,
    MonitorTransition, MonitoringState, NotificationEvent, Record, ScoreEvent, SensorUpdate,
    Topic,
};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::bus::{FeedBus, Subscription};
use crate::timer::{schedule, schedule_repeating, TimerSlot};

/// How long a notification stays up before it is dismissed.
pub const DEFAULT_NOTIFICATION_DISPLAY: Duration = Duration::from_millis(4000);

/// Broadcast channel capacity for interpreter outputs.
const OUTPUT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Tunable timings for [`SensorInterpreter`].
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Interval between countdown ticks. Zero is replaced by the default.
    pub countdown_step: Duration,
    /// Delay before a shown notification is dismissed.
    pub notification_display: Duration,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            countdown_step: Duration::from_millis(COUNTDOWN_STEP_MS as u64),
            notification_display: DEFAULT_NOTIFICATION_DISPLAY,
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Everything the interpreter tells its presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpreterOutput {
    SensorDisplay(DisplayFields),
    Indicators(DetectionIndicators),
    Notification {
        event: DetectedEvent,
        notification: NotificationEvent,
        /// The auto-detected score this event would record.
        score: ScoreEvent,
    },
    NotificationDismissed,
    MonitoringStatus {
        active: bool,
        text: String,
    },
    Countdown {
        tick: CountdownTick,
        text: String,
    },
    CountdownCleared,
    CountdownError {
        text: String,
    },
    Celebration {
        celebration: Celebration,
        label: String,
        score: ScoreEvent,
    },
}

/// Point-in-time copy of the interpreter's display state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpreterSnapshot {
    pub display: DisplayFields,
    pub monitor: MonitorDisplay,
    pub last_notification: Option<NotificationEvent>,
}

// ---------------------------------------------------------------------------
// SensorInterpreter
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InterpreterState {
    display: DisplayFields,
    monitor: MonitorDisplay,
    last_notification: Option<NotificationEvent>,
    countdown_generation: u64,
    notification_generation: u64,
    shut_down: bool,
}

type SharedState = Arc<Mutex<InterpreterState>>;

fn lock(state: &Mutex<InterpreterState>) -> MutexGuard<'_, InterpreterState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transport-independent handler for decoded feed records.
///
/// Share via `Arc<SensorInterpreter>`; all methods take `&self`. Timer
/// methods must run inside a tokio runtime.
pub struct SensorInterpreter {
    config: InterpreterConfig,
    state: SharedState,
    outputs: broadcast::Sender<InterpreterOutput>,
    countdown: TimerSlot,
    dismissal: TimerSlot,
}

impl SensorInterpreter {
    pub fn new(mut config: InterpreterConfig) -> Self {
        if config.countdown_step.is_zero() {
            let fallback = InterpreterConfig::default().countdown_step;
            tracing::warn!(
                fallback_ms = fallback.as_millis() as u64,
                "Zero countdown step, using default"
            );
            config.countdown_step = fallback;
        }

        let (outputs, _) = broadcast::channel(OUTPUT_CHANNEL_CAPACITY);
        Self {
            config,
            state: Arc::new(Mutex::new(InterpreterState::default())),
            outputs,
            countdown: TimerSlot::new(),
            dismissal: TimerSlot::new(),
        }
    }

    /// Receive every output emitted from now on.
    pub fn subscribe_outputs(&self) -> broadcast::Receiver<InterpreterOutput> {
        self.outputs.subscribe()
    }

    pub fn snapshot(&self) -> InterpreterSnapshot {
        let state = lock(&self.state);
        InterpreterSnapshot {
            display: state.display.clone(),
            monitor: state.monitor.clone(),
            last_notification: state.last_notification.clone(),
        }
    }

    /// Whether no countdown is running and no notification is showing.
    pub fn is_idle(&self) -> bool {
        let state = lock(&self.state);
        state.monitor.countdown() == CountdownState::Inactive && state.last_notification.is_none()
    }

    /// Resolve once [`Self::is_idle`] holds, checking every `poll`.
    ///
    /// Callers bound the wait with `tokio::time::timeout`; a countdown with
    /// monitoring left active runs until it reaches zero.
    pub async fn wait_idle(&self, poll: Duration) {
        while !self.is_idle() {
            tokio::time::sleep(poll).await;
        }
    }

    /// Register this interpreter as the handler for every topic on `bus`.
    pub fn attach(self: &Arc<Self>, bus: &FeedBus) -> Vec<Subscription> {
        Topic::ALL
            .into_iter()
            .map(|topic| {
                let interpreter = Arc::clone(self);
                bus.on_update(topic, move |record| interpreter.handle(topic, record))
            })
            .collect()
    }

    /// Handle one decoded snapshot.
    pub fn handle(&self, topic: Topic, record: &Record) {
        if lock(&self.state).shut_down {
            tracing::debug!(%topic, "Interpreter shut down, ignoring update");
            return;
        }

        match topic {
            Topic::Sensor => self.handle_sensor(record),
            Topic::Detection => self.handle_detection(record),
            Topic::System => self.handle_system(record),
            Topic::CricketScore => self.handle_score(record),
        }
    }

    /// Cancel both timers and ignore further updates.
    pub fn shutdown(&self) {
        let mut state = lock(&self.state);
        state.shut_down = true;
        state.countdown_generation += 1;
        state.notification_generation += 1;
        let countdown = self.countdown.cancel();
        let dismissal = self.dismissal.cancel();
        tracing::info!(countdown, dismissal, "Sensor interpreter shut down");
    }

    fn emit(&self, output: InterpreterOutput) {
        let _ = self.outputs.send(output);
    }

    fn handle_sensor(&self, record: &Record) {
        let update = SensorUpdate::from_record(record);
        if update.is_empty() {
            tracing::debug!("Sensor record carried no known fields");
            return;
        }

        if let Some(Err(e)) = &update.distance_cm {
            tracing::warn!(error = %e, "Malformed distance reading");
        }
        if let Some(Err(e)) = &update.sound_level {
            tracing::warn!(error = %e, "Malformed sound reading");
        }

        let display = {
            let mut state = lock(&self.state);
            state.display.apply(&update);
            state.display.clone()
        };
        self.emit(InterpreterOutput::SensorDisplay(display));
    }

    fn handle_detection(&self, record: &Record) {
        let sample = DetectionSample::from_record(record);
        self.emit(InterpreterOutput::Indicators(DetectionIndicators::from(
            &sample,
        )));

        let Some(event) = classify_event(&sample) else {
            tracing::trace!(?sample, "No detection rule matched");
            return;
        };
        let notification = event.notification();
        let score = event.score_event(overs_from_record(record), Utc::now());
        tracing::info!(
            ?event,
            message = %notification.message,
            overs = score.overs(),
            "Boundary event detected"
        );

        let mut state = lock(&self.state);
        if state.shut_down {
            return;
        }
        state.last_notification = Some(notification.clone());
        state.notification_generation += 1;
        let generation = state.notification_generation;

        self.emit(InterpreterOutput::Notification {
            event,
            notification,
            score,
        });

        let shared = Arc::clone(&self.state);
        let outputs = self.outputs.clone();
        let delay = self.config.notification_display;
        self.dismissal.replace_with(|| {
            schedule(delay, move || {
                let mut state = lock(&shared);
                if state.notification_generation != generation {
                    return;
                }
                state.last_notification = None;
                let _ = outputs.send(InterpreterOutput::NotificationDismissed);
            })
        });
    }

    fn handle_system(&self, record: &Record) {
        let Some(monitoring) = MonitoringState::from_record(record) else {
            tracing::debug!("System record carried no monitoring flag");
            return;
        };

        let mut state = lock(&self.state);
        if state.shut_down {
            return;
        }
        let transition = state.monitor.apply(&monitoring);
        self.emit(InterpreterOutput::MonitoringStatus {
            active: state.monitor.is_active(),
            text: state.monitor.status_text().to_string(),
        });

        match transition {
            MonitorTransition::StatusOnly => {}
            MonitorTransition::StopCountdown => {
                state.countdown_generation += 1;
                self.countdown.cancel();
                self.emit(InterpreterOutput::CountdownCleared);
            }
            MonitorTransition::CountdownError => {
                state.countdown_generation += 1;
                self.countdown.cancel();
                if let Some(Err(e)) = &monitoring.remaining_ms {
                    tracing::warn!(error = %e, "Malformed monitoring remaining time");
                }
                self.emit(InterpreterOutput::CountdownError {
                    text: state.monitor.countdown_text().to_string(),
                });
            }
            MonitorTransition::StartCountdown { remaining_ms } => {
                state.countdown_generation += 1;
                let generation = state.countdown_generation;
                tracing::debug!(remaining_ms, generation, "Starting monitoring countdown");

                let shared = Arc::clone(&self.state);
                let outputs = self.outputs.clone();
                self.countdown.replace_with(|| {
                    schedule_repeating(self.config.countdown_step, move || {
                        countdown_step(&shared, &outputs, generation)
                    })
                });
            }
        }
    }

    fn handle_score(&self, record: &Record) {
        match Celebration::from_record(record) {
            Ok(Some(celebration)) => {
                let score = celebration.score_event(overs_from_record(record), Utc::now());
                tracing::info!(?celebration, overs = score.overs(), "Celebration triggered");
                self.emit(InterpreterOutput::Celebration {
                    celebration,
                    label: celebration.label().to_string(),
                    score,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring score update"),
        }
    }
}

impl Default for SensorInterpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

impl Drop for SensorInterpreter {
    fn drop(&mut self) {
        self.countdown.cancel();
        self.dismissal.cancel();
    }
}

/// One countdown timer firing.
fn countdown_step(
    shared: &Mutex<InterpreterState>,
    outputs: &broadcast::Sender<InterpreterOutput>,
    generation: u64,
) -> ControlFlow<()> {
    let mut state = lock(shared);
    if state.countdown_generation != generation {
        return ControlFlow::Break(());
    }

    match state.monitor.tick() {
        Some(tick) => {
            let _ = outputs.send(InterpreterOutput::Countdown {
                tick,
                text: tick.text(),
            });
            if tick.should_continue() {
                ControlFlow::Continue(())
            } else {
                tracing::debug!("Monitoring countdown finished");
                ControlFlow::Break(())
            }
        }
        None => ControlFlow::Break(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
