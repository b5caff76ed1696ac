//! Feed subscription, timers, and the stateful sensor interpreter.
//!
//! - [`FeedBus`]: in-process publish/subscribe hub for decoded feed
//!   snapshots, backed by `tokio::sync::broadcast`.
//! - [`timer`]: cancellable one-shot and repeating timers plus
//!   [`TimerSlot`] for atomic cancel-and-replace.
//! - [`SensorInterpreter`]: turns feed records into display updates,
//!   notifications, and countdown ticks.

pub mod bus;
pub mod interpreter;
pub mod timer;

pub use bus::{FeedBus, FeedUpdate, Subscription};
pub use interpreter::{
    InterpreterConfig, InterpreterOutput, InterpreterSnapshot, SensorInterpreter,
};
pub use timer::{schedule, schedule_repeating, CancelHandle, TimerSlot};
