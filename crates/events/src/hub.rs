//! In-memory subscriber registry and fan-out.
//!
//! [`EventHub`] owns the only shared mutable state of the realtime layer: a
//! map from [`SubscriberKey`] to the set of open connections registered under
//! it. It is constructed once per process and shared via `Arc<EventHub>`.
//!
//! Delivery is best-effort. Writing to a connection is a non-blocking channel
//! send; a send that fails means the receiving side is gone, so the
//! connection is pruned on the spot and the publisher is never told. A missed
//! event is not queued or retried.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};

use crate::event::Event;
use crate::frame::Frame;
use crate::key::SubscriberKey;

/// Unique id of one open connection.
pub type ConnectionId = uuid::Uuid;

/// Sender half used by the hub to write frames to a connection.
pub type FrameSender = mpsc::UnboundedSender<Frame>;

/// Receiver half drained by the transport that owns the connection.
pub type FrameReceiver = mpsc::UnboundedReceiver<Frame>;

/// One open push channel, as held by the hub.
///
/// The channel is unbounded and FIFO, so frames reach a single connection in
/// the order the fan-out calls were issued.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    sender: FrameSender,
}

impl Connection {
    /// Open a new connection, returning the hub-side handle and the receiver
    /// the transport forwards to the client.
    pub fn open() -> (Self, FrameReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let conn = Self {
            id: uuid::Uuid::new_v4(),
            sender,
        };
        (conn, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Write a frame. Returns `false` when the receiving side has gone away.
    fn write(&self, frame: Frame) -> bool {
        self.sender.send(frame).is_ok()
    }
}

/// Outcome of a fan-out call.
///
/// Publishers may ignore it; it exists so pruning is observable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Connections the frame was written to.
    pub delivered: usize,
    /// Connections removed because the write failed.
    pub pruned: usize,
}

type ConnectionSet = HashMap<ConnectionId, Connection>;

/// Keyed registry of open connections with broadcast and targeted fan-out.
pub struct EventHub {
    subscribers: RwLock<HashMap<SubscriberKey, ConnectionSet>>,
}

impl EventHub {
    /// Create a new, empty hub.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register `conn` under `key`.
    ///
    /// Registering the same connection id twice under one key replaces the
    /// earlier handle.
    pub async fn subscribe(&self, key: SubscriberKey, conn: Connection) {
        let conn_id = conn.id;
        let mut subscribers = self.subscribers.write().await;
        subscribers.entry(key.clone()).or_default().insert(conn_id, conn);
        tracing::debug!(conn_id = %conn_id, key = %key, "Subscriber registered");
    }

    /// Remove a connection from `key`'s set, dropping the key once its set is
    /// empty. Returns whether the connection was registered.
    pub async fn unsubscribe(&self, key: &SubscriberKey, conn_id: ConnectionId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let Some(set) = subscribers.get_mut(key) else {
            return false;
        };
        let removed = set.remove(&conn_id).is_some();
        if set.is_empty() {
            subscribers.remove(key);
        }
        if removed {
            tracing::debug!(conn_id = %conn_id, key = %key, "Subscriber removed");
        }
        removed
    }

    /// Deliver `event` to every connection under every key.
    pub async fn publish(&self, event: Event) -> Delivery {
        let event_type = event.event_type.clone();
        let delivery = self.fan_out(None, Frame::from(event)).await;
        tracing::debug!(
            event_type = %event_type,
            delivered = delivery.delivered,
            pruned = delivery.pruned,
            "Event broadcast",
        );
        delivery
    }

    /// Deliver `event` only to connections registered under `key`.
    pub async fn publish_to(&self, key: &SubscriberKey, event: Event) -> Delivery {
        let event_type = event.event_type.clone();
        let delivery = self.fan_out(Some(key), Frame::from(event)).await;
        tracing::debug!(
            event_type = %event_type,
            key = %key,
            delivered = delivery.delivered,
            pruned = delivery.pruned,
            "Targeted event sent",
        );
        delivery
    }

    /// Write a keep-alive frame to every open connection.
    ///
    /// Called on a fixed cadence by the server's heartbeat task; a dead
    /// connection is discovered and pruned here even when nothing is being
    /// published.
    pub async fn heartbeat(&self) -> Delivery {
        self.fan_out(None, Frame::KeepAlive).await
    }

    /// Write `frame` to the connections under `target` (or all keys when
    /// `None`), pruning failed writes and emptied keys.
    ///
    /// The whole pass runs under the write lock, so concurrent
    /// `subscribe`/`unsubscribe` calls land strictly before or after it.
    async fn fan_out(&self, target: Option<&SubscriberKey>, frame: Frame) -> Delivery {
        let mut subscribers = self.subscribers.write().await;
        let mut delivery = Delivery::default();

        match target {
            Some(key) => {
                if let Some(set) = subscribers.get_mut(key) {
                    write_all(key, set, &frame, &mut delivery);
                    if set.is_empty() {
                        subscribers.remove(key);
                    }
                }
            }
            None => {
                for (key, set) in subscribers.iter_mut() {
                    write_all(key, set, &frame, &mut delivery);
                }
                subscribers.retain(|_, set| !set.is_empty());
            }
        }

        delivery
    }

    /// Number of open connections across all keys.
    pub async fn connection_count(&self) -> usize {
        self.subscribers
            .read()
            .await
            .values()
            .map(HashMap::len)
            .sum()
    }

    /// Number of keys with at least one open connection.
    pub async fn key_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Ids of the connections currently registered under `key`.
    pub async fn connections_for(&self, key: &SubscriberKey) -> Vec<ConnectionId> {
        self.subscribers
            .read()
            .await
            .get(key)
            .map(|set| set.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Drop every connection, closing their channels.
    ///
    /// Used during graceful shutdown; transports observe the closed channel
    /// and end their streams.
    pub async fn shutdown_all(&self) -> usize {
        let mut subscribers = self.subscribers.write().await;
        let count = subscribers.values().map(HashMap::len).sum();
        subscribers.clear();
        tracing::info!(count, "Closed all subscriber connections");
        count
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

fn write_all(key: &SubscriberKey, set: &mut ConnectionSet, frame: &Frame, delivery: &mut Delivery) {
    set.retain(|conn_id, conn| {
        if conn.write(frame.clone()) {
            delivery.delivered += 1;
            true
        } else {
            tracing::debug!(conn_id = %conn_id, key = %key, "Write failed, pruning connection");
            delivery.pruned += 1;
            false
        }
    });
}
