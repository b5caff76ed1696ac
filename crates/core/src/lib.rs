//! Domain logic for the boundary sensor interpreter.
//!
//! Everything here is synchronous and side-effect free. Scheduling and
//! feed subscription live in `boundvision-events`.

pub mod classify;
pub mod display;
pub mod error;
pub mod field;
pub mod monitoring;
pub mod score;
pub mod sensor;
pub mod topic;
pub mod types;

pub use classify::{classify, classify_event, DetectedEvent, NotificationEvent};
pub use display::{format_sample, DisplayFields, FieldDisplay};
pub use error::CoreError;
pub use monitoring::{
    tick_countdown, CountdownState, CountdownTick, MonitorDisplay, MonitorTransition,
    MonitoringState,
};
pub use score::{overs_from_record, Celebration, ScoreEvent, ScoreKind};
pub use sensor::{DetectionIndicators, DetectionSample, SensorSample, SensorUpdate};
pub use topic::Topic;
pub use types::Record;
