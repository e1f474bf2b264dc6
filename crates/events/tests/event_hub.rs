//! Integration tests for `EventHub`.
//!
//! These tests drive the hub through its public contract only: connections
//! are opened with `Connection::open`, registered under typed keys, and
//! observed through their frame receivers.

use assert_matches::assert_matches;
use teamboard_events::{Connection, Delivery, Event, EventHub, Frame, SubscriberKey};
use tokio::sync::mpsc::error::TryRecvError;

fn event(event_type: &str, n: u32) -> Event {
    Event::new(event_type, serde_json::json!({ "n": n }))
}

// ---------------------------------------------------------------------------
// Test: new hub starts empty
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_hub_has_no_connections() {
    let hub = EventHub::new();

    assert_eq!(hub.connection_count().await, 0);
    assert_eq!(hub.key_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: hubs are isolated from each other
// ---------------------------------------------------------------------------

#[tokio::test]
async fn separate_hubs_do_not_share_registries() {
    let first = EventHub::new();
    let second = EventHub::new();

    let (conn, mut rx) = Connection::open();
    first.subscribe(SubscriberKey::principal("1"), conn).await;

    let delivery = second.publish(event("task_created", 1)).await;

    assert_eq!(delivery, Delivery::default());
    assert_matches!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(second.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: broadcast delivers exactly one copy per connection, in issue order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_delivers_each_event_once_in_order() {
    let hub = EventHub::new();

    let (c1, mut rx1) = Connection::open();
    let (c2, mut rx2) = Connection::open();
    let (c3, mut rx3) = Connection::open();
    hub.subscribe(SubscriberKey::principal("1"), c1).await;
    hub.subscribe(SubscriberKey::principal("1"), c2).await;
    hub.subscribe(SubscriberKey::role("ADMIN"), c3).await;

    for n in 0..3 {
        let delivery = hub.publish(event("task_updated", n)).await;
        assert_eq!(delivery.delivered, 3);
    }

    for rx in [&mut rx1, &mut rx2, &mut rx3] {
        for expected in 0..3 {
            let frame = rx.recv().await.expect("frame should be delivered");
            let received = frame.as_event().expect("frame should carry an event");
            assert_eq!(received.event_type, "task_updated");
            assert_eq!(received.payload["n"], expected);
        }
        assert_matches!(rx.try_recv(), Err(TryRecvError::Empty));
    }
}

// ---------------------------------------------------------------------------
// Test: connections registered after a publish do not see it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn late_subscriber_misses_earlier_events() {
    let hub = EventHub::new();

    hub.publish(event("team_created", 1)).await;

    let (conn, mut rx) = Connection::open();
    hub.subscribe(SubscriberKey::principal("2"), conn).await;

    assert_matches!(rx.try_recv(), Err(TryRecvError::Empty));
}

// ---------------------------------------------------------------------------
// Test: targeted delivery to a role reaches every connection of that role
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_to_role_reaches_all_role_connections() {
    let hub = EventHub::new();
    let admins = SubscriberKey::role("ADMIN");

    let (a1, mut rx_a1) = Connection::open();
    let (a2, mut rx_a2) = Connection::open();
    let (member, mut rx_member) = Connection::open();
    hub.subscribe(admins.clone(), a1).await;
    hub.subscribe(admins.clone(), a2).await;
    hub.subscribe(SubscriberKey::role("MEMBER"), member).await;

    let delivery = hub.publish_to(&admins, event("pending_created", 4)).await;

    assert_eq!(delivery, Delivery { delivered: 2, pruned: 0 });
    assert!(rx_a1.recv().await.is_some());
    assert!(rx_a2.recv().await.is_some());
    assert_matches!(rx_member.try_recv(), Err(TryRecvError::Empty));
}

// ---------------------------------------------------------------------------
// Test: targeted delivery to an unknown key is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_to_unknown_key_is_noop() {
    let hub = EventHub::new();

    let delivery = hub
        .publish_to(&SubscriberKey::principal("nobody"), event("task_assigned", 1))
        .await;

    assert_eq!(delivery, Delivery::default());
    assert_eq!(hub.key_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: a dead connection is pruned and its siblings keep receiving
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dead_connection_is_pruned_and_siblings_keep_receiving() {
    let hub = EventHub::new();
    let key = SubscriberKey::principal("7");

    let (dead, rx_dead) = Connection::open();
    let dead_id = dead.id();
    let (alive, mut rx_alive) = Connection::open();
    let alive_id = alive.id();
    hub.subscribe(key.clone(), dead).await;
    hub.subscribe(key.clone(), alive).await;

    drop(rx_dead);

    let delivery = hub.publish_to(&key, event("task_assigned", 1)).await;
    assert_eq!(delivery, Delivery { delivered: 1, pruned: 1 });

    let listed = hub.connections_for(&key).await;
    assert_eq!(listed, vec![alive_id]);
    assert!(!listed.contains(&dead_id));

    // The next publish reaches only the survivor and prunes nothing.
    let delivery = hub.publish(event("task_updated", 2)).await;
    assert_eq!(delivery, Delivery { delivered: 1, pruned: 0 });

    assert!(rx_alive.recv().await.is_some());
    assert!(rx_alive.recv().await.is_some());
}

// ---------------------------------------------------------------------------
// Test: an emptied key is removed from the registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn emptied_key_is_removed_after_failed_write() {
    let hub = EventHub::new();
    let (conn, rx) = Connection::open();
    hub.subscribe(SubscriberKey::role("ADMIN"), conn).await;
    drop(rx);

    hub.publish(event("pending_resolved", 1)).await;

    assert_eq!(hub.key_count().await, 0);
    assert_eq!(hub.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: heartbeat writes a keep-alive frame to every connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn heartbeat_reaches_every_connection() {
    let hub = EventHub::new();
    let (c1, mut rx1) = Connection::open();
    let (c2, mut rx2) = Connection::open();
    hub.subscribe(SubscriberKey::principal("1"), c1).await;
    hub.subscribe(SubscriberKey::role("ADMIN"), c2).await;

    let delivery = hub.heartbeat().await;

    assert_eq!(delivery.delivered, 2);
    assert_eq!(rx1.recv().await, Some(Frame::KeepAlive));
    assert_eq!(rx2.recv().await, Some(Frame::KeepAlive));
}

// ---------------------------------------------------------------------------
// Test: unsubscribe of an unknown connection is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsubscribe_unknown_connection_is_noop() {
    let hub = EventHub::new();
    let key = SubscriberKey::principal("1");
    let (conn, _rx) = Connection::open();
    hub.subscribe(key.clone(), conn).await;

    let (stranger, _rx_stranger) = Connection::open();
    assert!(!hub.unsubscribe(&key, stranger.id()).await);

    assert_eq!(hub.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: shutdown_all closes every channel and clears the registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_closes_channels() {
    let hub = EventHub::new();
    let (c1, mut rx1) = Connection::open();
    let (c2, mut rx2) = Connection::open();
    hub.subscribe(SubscriberKey::principal("1"), c1).await;
    hub.subscribe(SubscriberKey::principal("2"), c2).await;

    assert_eq!(hub.shutdown_all().await, 2);

    assert_eq!(hub.connection_count().await, 0);
    assert!(rx1.recv().await.is_none(), "channel should be closed");
    assert!(rx2.recv().await.is_none(), "channel should be closed");
}
