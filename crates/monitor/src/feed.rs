//! Line-delimited JSON feed adapter.
//!
//! Each non-blank line is one snapshot: `{"topic": "<name>", "record": {...}}`.
//! A bad line (invalid UTF-8, invalid JSON, unknown topic) is skipped; only
//! an I/O error on the underlying reader ends the feed early.

use boundvision_core::{CoreError, Record, Topic};
use boundvision_events::FeedBus;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, thiserror::Error)]
pub enum FeedLineError {
    #[error("Feed line is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Malformed feed line: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Topic(#[from] CoreError),
}

#[derive(Deserialize)]
struct RawLine {
    topic: String,
    #[serde(default)]
    record: Record,
}

/// Decode one feed line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<(Topic, Record)>, FeedLineError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let raw: RawLine = serde_json::from_str(line)?;
    let topic = raw.topic.parse::<Topic>()?;
    Ok(Some((topic, raw.record)))
}

/// Decode one raw feed line, including its UTF-8 check.
pub fn parse_bytes(line: &[u8]) -> Result<Option<(Topic, Record)>, FeedLineError> {
    parse_line(std::str::from_utf8(line)?)
}

/// Counters for one pass over a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub lines: u64,
    pub published: u64,
    pub skipped: u64,
}

/// Publish every line of `reader` on `bus` until EOF.
///
/// Returns the counters on EOF, or the I/O error that stopped reading.
pub async fn pump<R>(reader: R, bus: &FeedBus) -> Result<FeedStats, std::io::Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = reader;
    let mut stats = FeedStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(stats);
        }
        stats.lines += 1;

        match parse_bytes(&buf) {
            Ok(Some((topic, record))) => {
                tracing::debug!(%topic, line_no = stats.lines, "Feed update");
                bus.publish(topic, record);
                stats.published += 1;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(line_no = stats.lines, error = %e, "Skipping feed line");
                stats.skipped += 1;
            }
        }
    }
}
