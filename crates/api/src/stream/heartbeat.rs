use std::sync::Arc;
use std::time::Duration;

use teamboard_events::EventHub;

/// Spawn a background task that writes a keep-alive frame to every open
/// stream once per `interval`.
///
/// Each tick also prunes connections whose client has gone away. The
/// returned `JoinHandle` is aborted during shutdown.
pub fn start_heartbeat(hub: Arc<EventHub>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; streams have just sent their ack.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let delivery = hub.heartbeat().await;
            tracing::debug!(
                delivered = delivery.delivered,
                pruned = delivery.pruned,
                "Stream heartbeat",
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamboard_events::{Connection, Frame, SubscriberKey};

    #[tokio::test(start_paused = true)]
    async fn writes_keepalive_each_interval() {
        let hub = Arc::new(EventHub::new());
        let (conn, mut rx) = Connection::open();
        hub.subscribe(SubscriberKey::principal("1"), conn).await;

        let handle = start_heartbeat(Arc::clone(&hub), Duration::from_secs(25));

        tokio::time::sleep(Duration::from_secs(24)).await;
        assert!(rx.try_recv().is_err(), "no keep-alive before the first interval");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.recv().await, Some(Frame::KeepAlive));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn prunes_closed_connections() {
        let hub = Arc::new(EventHub::new());
        let (conn, rx) = Connection::open();
        hub.subscribe(SubscriberKey::role("ADMIN"), conn).await;
        drop(rx);

        let handle = start_heartbeat(Arc::clone(&hub), Duration::from_secs(25));
        tokio::time::sleep(Duration::from_secs(26)).await;

        assert_eq!(hub.connection_count().await, 0);
        assert_eq!(hub.key_count().await, 0);
        handle.abort();
    }
}
