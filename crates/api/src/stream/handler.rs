use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures::{stream, Stream, StreamExt};
use teamboard_events::{Connection, ConnectionId, Event, EventHub, Frame, SubscriberKey};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Content type of the notification stream.
pub const EVENT_STREAM_MIME: &str = "text/event-stream";

/// How a stream endpoint keys its connections in the hub it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKeyMode {
    /// One key per user; receives notices aimed at that user.
    Principal,
    /// One key per account role; receives notices aimed at the role.
    Role,
}

impl StreamKeyMode {
    pub fn key_for(self, user: &AuthUser) -> SubscriberKey {
        match self {
            StreamKeyMode::Principal => SubscriberKey::principal(user.user_id.clone()),
            StreamKeyMode::Role => SubscriberKey::role(user.role.clone()),
        }
    }
}

/// GET /api/v1/notifications/stream
///
/// Task notifications: every broadcast, plus events targeted at the caller's
/// user id (`task_assigned`).
pub async fn principal_stream(user: AuthUser, State(state): State<AppState>) -> Response {
    open_stream(user, Arc::clone(&state.hub), StreamKeyMode::Principal).await
}

/// GET /api/v1/notifications/role-stream
///
/// Review-queue notifications targeted at the caller's role
/// (`pending_created`, `pending_resolved` for `ADMIN`).
pub async fn role_stream(user: AuthUser, State(state): State<AppState>) -> Response {
    open_stream(user, Arc::clone(&state.role_hub), StreamKeyMode::Role).await
}

/// Open a push stream on `hub` for the authenticated caller.
///
/// The first frame is the `connected` acknowledgement; afterwards the
/// connection receives whatever the hub writes to its key, plus keep-alive
/// comments from the heartbeat task. The connection is unsubscribed when the
/// client goes away.
async fn open_stream(user: AuthUser, hub: Arc<EventHub>, mode: StreamKeyMode) -> Response {
    let key = mode.key_for(&user);

    let (conn, rx) = Connection::open();
    let conn_id = conn.id();
    hub.subscribe(key.clone(), conn).await;
    tracing::info!(conn_id = %conn_id, key = %key, "Notification stream opened");

    let frames = SubscribedFrames {
        inner: UnboundedReceiverStream::new(rx),
        hub,
        key,
        conn_id,
    };

    let body = stream::once(async { Frame::from(Event::connected()) })
        .chain(frames)
        .map(|frame| Ok::<_, Infallible>(frame.encode()));

    (
        [
            (CONTENT_TYPE, EVENT_STREAM_MIME),
            (CACHE_CONTROL, "no-cache, no-transform"),
            (CONNECTION, "keep-alive"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

/// Frames written to one connection. Unsubscribes from the hub when the
/// response body is dropped, which happens on client disconnect, server
/// shutdown, or request cancellation.
struct SubscribedFrames {
    inner: UnboundedReceiverStream<Frame>,
    hub: Arc<EventHub>,
    key: SubscriberKey,
    conn_id: ConnectionId,
}

impl Stream for SubscribedFrames {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Frame>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for SubscribedFrames {
    fn drop(&mut self) {
        let hub = Arc::clone(&self.hub);
        let key = self.key.clone();
        let conn_id = self.conn_id;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    hub.unsubscribe(&key, conn_id).await;
                    tracing::info!(conn_id = %conn_id, key = %key, "Notification stream closed");
                });
            }
            // The runtime is gone; the next write to this connection fails
            // and prunes it anyway.
            Err(_) => {
                tracing::debug!(conn_id = %conn_id, "No runtime to unsubscribe on");
            }
        }
    }
}
