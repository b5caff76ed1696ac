//! `boundvision-monitor` -- drives the sensor interpreter from a feed on stdin.
//!
//! Reads one JSON snapshot per line (`{"topic": "...", "record": {...}}`),
//! publishes it on the feed bus, and writes every interpreter output to
//! stdout. Logs go to stderr. Lines that are not valid UTF-8 or JSON are
//! logged and skipped. On EOF a running countdown or visible notification
//! is allowed to finish (bounded by `EOF_LINGER_MS`); Ctrl-C stops at once.
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default | Description                         |
//! |---------------------------|----------|---------|-------------------------------------|
//! | `NOTIFICATION_DISPLAY_MS` | no       | `4000`  | Notification dismissal delay        |
//! | `FEED_CHANNEL_CAPACITY`   | no       | `1024`  | Feed bus buffer size                |
//! | `OUTPUT_FORMAT`           | no       | `json`  | `json` or `text` output lines       |
//! | `LOG_FORMAT`              | no       | `text`  | `json` or `text` log lines          |
//! | `EOF_LINGER_MS`           | no       | `30000` | Max wait for timers after EOF       |
//! | `RUST_LOG`                | no       | --      | Standard `tracing` filter directive |

use std::sync::Arc;
use std::time::Duration;

use boundvision_events::{FeedBus, InterpreterOutput, SensorInterpreter};
use tokio::io::BufReader;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod feed;
mod render;

use config::{MonitorConfig, OutputFormat};

/// Upper bound on waiting for buffered outputs to flush at shutdown.
const OUTPUT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// How often to check for idle timers while lingering after EOF.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Why the feed stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedEnd {
    Eof,
    Interrupted,
    Failed,
}

fn init_tracing(json_logs: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "boundvision_monitor=info,boundvision_events=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = MonitorConfig::from_env();
    init_tracing(config.as_ref().is_ok_and(|c| c.json_logs));

    let config = config.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        feed_capacity = config.feed_capacity,
        notification_display_ms = config.notification_display.as_millis() as u64,
        output_format = ?config.output_format,
        eof_linger_ms = config.eof_linger.as_millis() as u64,
        "Starting boundvision-monitor",
    );

    let bus = FeedBus::new(config.feed_capacity);
    let interpreter = Arc::new(SensorInterpreter::new(config.interpreter()));
    let printer = tokio::spawn(print_outputs(
        interpreter.subscribe_outputs(),
        config.output_format,
    ));
    let subscriptions = interpreter.attach(&bus);

    let end = read_feed(&bus).await;

    // Closing the bus lets each subscription deliver what is buffered, then exit.
    drop(bus);
    for sub in subscriptions {
        sub.join().await;
    }

    if end == FeedEnd::Eof {
        linger(&interpreter, config.eof_linger).await;
    }

    interpreter.shutdown();
    drop(interpreter);

    if tokio::time::timeout(OUTPUT_FLUSH_TIMEOUT, printer).await.is_err() {
        tracing::warn!("Timed out flushing interpreter outputs");
    }
    tracing::info!("boundvision-monitor stopped");
}

/// Publish stdin lines on `bus` until EOF, a read error, or Ctrl-C.
async fn read_feed(bus: &FeedBus) -> FeedEnd {
    let reader = BufReader::new(tokio::io::stdin());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            FeedEnd::Interrupted
        }
        result = feed::pump(reader, bus) => match result {
            Ok(stats) => {
                tracing::info!(
                    lines = stats.lines,
                    published = stats.published,
                    skipped = stats.skipped,
                    "Feed closed"
                );
                FeedEnd::Eof
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read feed");
                FeedEnd::Failed
            }
        }
    }
}

/// Let a running countdown or visible notification finish, up to `limit`.
async fn linger(interpreter: &SensorInterpreter, limit: Duration) {
    if limit.is_zero() || interpreter.is_idle() {
        return;
    }

    tracing::info!(
        limit_ms = limit.as_millis() as u64,
        "Waiting for countdown and notification to finish"
    );
    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted while waiting for timers"),
        waited = tokio::time::timeout(limit, interpreter.wait_idle(IDLE_POLL)) => {
            if waited.is_err() {
                tracing::warn!("Timers still running at linger limit, stopping");
            }
        }
    }
}

/// Write interpreter outputs to stdout until every sender is gone.
async fn print_outputs(mut rx: broadcast::Receiver<InterpreterOutput>, format: OutputFormat) {
    loop {
        match rx.recv().await {
            Ok(output) => match render::render(&output, format) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::error!(error = %e, "Failed to render output"),
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Output printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
