//! In-process feed bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`FeedBus`] carries decoded realtime-feed snapshots keyed by
//! [`Topic`]. Transport adapters publish into it; consumers either take a
//! raw receiver via [`FeedBus::subscribe`] or register a per-topic handler
//! with [`FeedBus::on_update`].

use boundvision_core::types::Timestamp;
use boundvision_core::{Record, Topic};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// FeedUpdate
// ---------------------------------------------------------------------------

/// A whole-snapshot update for one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedUpdate {
    pub topic: Topic,

    /// Decoded `{field: value}` snapshot.
    pub record: Record,

    /// When the update entered the bus (UTC).
    pub received_at: Timestamp,
}

impl FeedUpdate {
    pub fn new(topic: Topic, record: Record) -> Self {
        Self {
            topic,
            record,
            received_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// FeedBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for feed updates.
///
/// Designed to be shared via `Arc<FeedBus>`.
pub struct FeedBus {
    sender: broadcast::Sender<FeedUpdate>,
}

impl FeedBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed updates are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a snapshot for `topic` to all current subscribers.
    ///
    /// With no subscribers the update is silently dropped.
    pub fn publish(&self, topic: Topic, record: Record) {
        let _ = self.sender.send(FeedUpdate::new(topic, record));
    }

    /// Subscribe to updates on every topic.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedUpdate> {
        self.sender.subscribe()
    }

    /// Invoke `handler` for every update on `topic`.
    ///
    /// Spawns a task that runs until the returned [`Subscription`] is
    /// cancelled or the bus is dropped. Must be called from within a tokio
    /// runtime.
    pub fn on_update<F>(&self, topic: Topic, mut handler: F) -> Subscription
    where
        F: FnMut(&Record) + Send + 'static,
    {
        let mut receiver = self.subscribe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    received = receiver.recv() => match received {
                        Ok(update) if update.topic == topic => handler(&update.record),
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(%topic, skipped = n, "Feed subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::debug!(%topic, "Feed bus closed, subscription ending");
                            break;
                        }
                    },
                }
            }
        });

        Subscription {
            topic,
            cancel,
            task,
        }
    }
}

impl Default for FeedBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// A live per-topic handler registration.
pub struct Subscription {
    topic: Topic,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Stop delivering updates to the handler.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the handler task to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(topic = %self.topic, error = %e, "Feed subscription task failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = FeedBus::default();
        let mut rx = bus.subscribe();

        bus.publish(Topic::Sensor, record(json!({"distance": 12.5})));

        let received = rx.recv().await.expect("should receive the update");
        assert_eq!(received.topic, Topic::Sensor);
        assert_eq!(received.record["distance"], 12.5);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = FeedBus::default();
        bus.publish(Topic::System, Record::new());
    }

    #[tokio::test]
    async fn on_update_filters_by_topic() {
        let bus = FeedBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let sub = bus.on_update(Topic::Detection, move |rec| {
            sink.lock().unwrap().push(rec.clone());
        });

        bus.publish(Topic::Sensor, record(json!({"sound": 1})));
        bus.publish(Topic::Detection, record(json!({"vibration": true})));
        drop(bus);
        sub.join().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["vibration"], true);
    }

    #[tokio::test]
    async fn lagged_subscription_skips_dropped_updates_and_continues() {
        let bus = FeedBus::new(2);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let sub = bus.on_update(Topic::Sensor, move |rec| {
            sink.lock().unwrap().push(rec["n"].as_i64().unwrap());
        });

        // The handler task has not run yet, so only the last two survive.
        for n in 1..=5 {
            bus.publish(Topic::Sensor, record(json!({ "n": n })));
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*seen.lock().unwrap(), vec![4, 5]);

        bus.publish(Topic::Sensor, record(json!({ "n": 6 })));
        drop(bus);
        sub.join().await;

        assert_eq!(*seen.lock().unwrap(), vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn cancelled_subscription_stops_delivery() {
        let bus = FeedBus::default();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = seen.clone();

        let sub = bus.on_update(Topic::System, move |_| {
            *sink.lock().unwrap() += 1;
        });
        assert_eq!(sub.topic(), Topic::System);

        sub.cancel();
        tokio::time::timeout(Duration::from_secs(1), async {
            while !sub.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscription task should exit");

        bus.publish(Topic::System, Record::new());
        tokio::task::yield_now().await;
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
