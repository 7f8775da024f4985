use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Event names pushed to viewers.
pub mod events {
    /// Sent once to every new subscriber.
    pub const CONNECTED: &str = "connected";
    /// A new check-in arrived from the workflow engine.
    pub const CHECKIN: &str = "checkin";
    /// A check-in or the active settings changed.
    pub const UPDATE: &str = "update";
    pub const PAYMENT_APPROVED: &str = "payment_approved";
    pub const DELETED: &str = "deleted";
}

/// A single notification. Viewers treat it as "something changed, refetch".
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct HubMessage {
    pub event: String,
    pub data: Value,
}

/// What a subscriber's pull loop yields.
#[derive(PartialEq, Debug, Clone)]
pub enum Delivery {
    Message(HubMessage),
    /// Nothing arrived within the idle window.
    KeepAlive,
}

/// In-process fan-out to every connected viewer.
///
/// Each subscriber owns a bounded queue. Publishing never waits: a subscriber whose
/// queue is full is presumed stuck and is dropped from the set, which closes its
/// queue once the pending messages are drained.
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<u64, mpsc::Sender<HubMessage>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(BroadcastHub {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, mpsc::Sender<HubMessage>>> {
        // The map holds no invariant a panicking holder could break.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new viewer. The returned [`Subscription`] deregisters itself on drop.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Queue is empty, the acknowledgement cannot fail.
        let _ = tx.try_send(HubMessage {
            event: events::CONNECTED.to_string(),
            data: json!({ "subscriber": id }),
        });

        let count = {
            let mut subscribers = self.lock();
            subscribers.insert(id, tx);
            subscribers.len()
        };
        log::info!("Subscriber {} connected ({} active)", id, count);

        Subscription {
            id,
            hub: Arc::clone(self),
            rx,
        }
    }

    /// Push an event to every subscriber without blocking.
    ///
    /// Returns the number of subscribers the event was queued for.
    pub fn broadcast(&self, event: &str, payload: Value) -> usize {
        let message = HubMessage {
            event: event.to_string(),
            data: payload,
        };

        let mut subscribers = self.lock();
        let mut dead = vec![];
        let mut delivered = 0;

        for (id, tx) in subscribers.iter() {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    log::warn!("Subscriber {} queue is full, dropping it", id);
                    dead.push(*id);
                }
                Err(TrySendError::Closed(_)) => dead.push(*id),
            }
        }

        for id in dead {
            subscribers.remove(&id);
        }

        log::debug!("Broadcast '{}' to {} subscribers", event, delivered);
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn unsubscribe(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }
}

/// Hub membership for one viewer connection.
pub struct Subscription {
    id: u64,
    hub: Arc<BroadcastHub>,
    rx: mpsc::Receiver<HubMessage>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait up to `idle` for the next message.
    ///
    /// Returns `None` once the hub has dropped this subscriber and its queue is drained.
    pub async fn next(&mut self, idle: Duration) -> Option<Delivery> {
        match tokio::time::timeout(idle, self.rx.recv()).await {
            Ok(Some(message)) => Some(Delivery::Message(message)),
            Ok(None) => None,
            Err(_) => Some(Delivery::KeepAlive),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.hub.unsubscribe(self.id) {
            log::info!("Subscriber {} disconnected", self.id);
        } else {
            log::debug!("Subscriber {} was already evicted", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(200);

    async fn expect_event(sub: &mut Subscription, event: &str) -> HubMessage {
        match sub.next(WAIT).await {
            Some(Delivery::Message(msg)) => {
                assert_eq!(msg.event, event);
                msg
            }
            other => panic!("expected '{}', got {:?}", event, other),
        }
    }

    #[tokio::test]
    async fn test_connected_acknowledgement() {
        let hub = BroadcastHub::new(4);
        let mut sub = hub.subscribe();
        let ack = expect_event(&mut sub, events::CONNECTED).await;
        assert_eq!(ack.data["subscriber"], json!(sub.id()));
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_fifo_per_subscriber() {
        let hub = BroadcastHub::new(8);
        let mut sub = hub.subscribe();
        expect_event(&mut sub, events::CONNECTED).await;

        hub.broadcast("A", json!({"n": 1}));
        hub.broadcast("B", json!({"n": 2}));

        expect_event(&mut sub, "A").await;
        expect_event(&mut sub, "B").await;
    }

    #[tokio::test]
    async fn test_stuck_subscriber_is_isolated() {
        let hub = BroadcastHub::new(2);
        let mut first = hub.subscribe();
        let mut stuck = hub.subscribe();
        let mut third = hub.subscribe();

        expect_event(&mut first, events::CONNECTED).await;
        expect_event(&mut third, events::CONNECTED).await;

        // Fills the stuck subscriber's queue (ack + A) while the others drain.
        assert_eq!(hub.broadcast("A", Value::Null), 3);
        expect_event(&mut first, "A").await;
        expect_event(&mut third, "A").await;

        assert_eq!(hub.broadcast("B", Value::Null), 2);
        assert_eq!(hub.subscriber_count(), 2);

        expect_event(&mut first, "B").await;
        expect_event(&mut third, "B").await;

        // The evicted subscriber still sees what was queued, then the stream ends.
        expect_event(&mut stuck, events::CONNECTED).await;
        expect_event(&mut stuck, "A").await;
        assert_eq!(stuck.next(WAIT).await, None);
    }

    #[tokio::test]
    async fn test_keepalive_on_idle() {
        let hub = BroadcastHub::new(4);
        let mut sub = hub.subscribe();
        expect_event(&mut sub, events::CONNECTED).await;
        assert_eq!(
            sub.next(Duration::from_millis(10)).await,
            Some(Delivery::KeepAlive)
        );
        // Still registered after a keep-alive.
        assert_eq!(hub.broadcast("A", Value::Null), 1);
    }

    #[tokio::test]
    async fn test_drop_deregisters() {
        let hub = BroadcastHub::new(4);
        let sub = hub.subscribe();
        let other = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(sub);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(hub.broadcast("A", Value::Null), 1);

        drop(other);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.broadcast("A", Value::Null), 0);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let hub = BroadcastHub::new(4);
        hub.broadcast("A", Value::Null);

        let mut sub = hub.subscribe();
        expect_event(&mut sub, events::CONNECTED).await;
        assert_eq!(
            sub.next(Duration::from_millis(10)).await,
            Some(Delivery::KeepAlive)
        );
    }

    #[tokio::test]
    async fn test_concurrent_cancellation() {
        let hub = BroadcastHub::new(4);
        let mut handles = vec![];
        for _ in 0..16 {
            let hub = hub.clone();
            handles.push(tokio::spawn(async move {
                let mut sub = hub.subscribe();
                // Cancelled while waiting.
                let _ = tokio::time::timeout(Duration::from_millis(5), sub.next(WAIT)).await;
                let _ = tokio::time::timeout(Duration::from_millis(5), sub.next(WAIT)).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(hub.subscriber_count(), 0);
    }
}
