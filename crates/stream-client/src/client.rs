//! Long-lived stream subscription with reconnect.
//!
//! [`StreamClient`] holds the target URL, credential and backoff settings.
//! [`StreamClient::subscribe`] spawns one task per subscription that runs the
//! connect, read, backoff cycle:
//!
//! ```text
//! Connecting -> Streaming -> BackoffWait -> Connecting -> ...
//!      \____________\_____________\________-> Stopped
//! ```
//!
//! [`Subscription::stop`] is effective from any state. The task suspends
//! only on the network read and on the backoff timer; both are raced against
//! the cancellation token, so stopping drops the in-flight request and no
//! callback runs afterwards.

use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backoff::{Backoff, BackoffConfig};
use crate::parser::{FrameParser, ParsedFrame, StreamEvent};

/// Media type requested from the stream endpoint.
pub const EVENT_STREAM_MIME: &str = "text/event-stream";

/// Error type returned by a [`StreamHandler`] that failed to process an event.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Failures reported to [`StreamHandler::on_error`].
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The request could not be sent (DNS, refused connection, TLS, ...).
    #[error("Connection error: {0}")]
    Connection(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Stream request failed ({status})")]
    Status { status: u16 },

    /// The server answered successfully but with an empty body.
    #[error("Stream response has no body")]
    NoBody,

    /// Reading the body failed mid-stream.
    #[error("Stream read error: {0}")]
    Read(#[source] reqwest::Error),

    /// The server ended the stream. This is a reconnect signal rather
    /// than a failure: it reaches `on_error` before the backoff wait, and
    /// the wait starts from the initial delay if the stream had delivered
    /// any bytes.
    #[error("Stream closed by server")]
    Closed,

    /// The event handler rejected an event. Reading continues.
    #[error("Event handler failed: {0}")]
    Handler(HandlerError),
}

/// Receives decoded events and failures for one subscription.
///
/// Both methods run on the subscription task, one call at a time.
pub trait StreamHandler: Send + 'static {
    /// Handle one event. An `Err` is passed to [`on_error`](Self::on_error)
    /// as [`StreamError::Handler`] and does not interrupt the stream.
    fn on_event(&mut self, event: StreamEvent) -> Result<(), HandlerError>;

    fn on_error(&mut self, error: &StreamError);
}

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Streaming,
    BackoffWait,
    Stopped,
}

/// Connection settings for the notification stream.
#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    /// Full stream URL, e.g. `http://host:8083/api/v1/notifications/stream`.
    pub url: String,
    /// Bearer token sent on every connection attempt.
    pub token: String,
    pub backoff: BackoffConfig,
    /// Treat a 401 response as terminal instead of retrying forever.
    pub stop_on_unauthorized: bool,
}

impl StreamClientConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            backoff: BackoffConfig::default(),
            stop_on_unauthorized: false,
        }
    }
}

/// Client for the notification stream of one service.
pub struct StreamClient {
    http: reqwest::Client,
    config: StreamClientConfig,
}

impl StreamClient {
    pub fn new(config: StreamClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client, config: StreamClientConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &StreamClientConfig {
        &self.config
    }

    /// Start a subscription task delivering to `handler`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<H: StreamHandler>(&self, handler: H) -> Subscription {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let task = SubscriptionTask {
            http: self.http.clone(),
            config: self.config.clone(),
            cancel: cancel.clone(),
            state: state_tx,
        };
        let handle = tokio::spawn(task.run(handler));

        Subscription {
            cancel,
            state: state_rx,
            handle,
        }
    }
}

/// Handle to a running subscription.
///
/// Dropping the handle stops the subscription.
pub struct Subscription {
    cancel: CancellationToken,
    state: watch::Receiver<ConnectionState>,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Stop the subscription. No callback is invoked after this returns and
    /// any in-flight request or backoff wait is abandoned.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Stop and wait for the subscription task to finish.
    pub async fn stop_and_wait(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.handle).await {
            tracing::warn!(error = %e, "Stream subscription task ended abnormally");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SubscriptionTask {
    http: reqwest::Client,
    config: StreamClientConfig,
    cancel: CancellationToken,
    state: watch::Sender<ConnectionState>,
}

impl SubscriptionTask {
    async fn run<H: StreamHandler>(self, mut handler: H) {
        let mut backoff = Backoff::new(self.config.backoff.clone());
        let mut attempt = 0u32;

        while !self.cancel.is_cancelled() {
            attempt += 1;
            self.state.send_replace(ConnectionState::Connecting);
            tracing::debug!(url = %self.config.url, attempt, "Opening notification stream");

            let error = tokio::select! {
                _ = self.cancel.cancelled() => break,
                error = self.stream_once(&mut handler, &mut backoff) => error,
            };

            if self.cancel.is_cancelled() {
                break;
            }

            handler.on_error(&error);

            if self.config.stop_on_unauthorized
                && matches!(error, StreamError::Status { status } if status == StatusCode::UNAUTHORIZED.as_u16())
            {
                tracing::warn!(url = %self.config.url, "Stream credential rejected, giving up");
                break;
            }

            let delay = backoff.fail();
            self.state.send_replace(ConnectionState::BackoffWait);
            tracing::warn!(
                url = %self.config.url,
                error = %error,
                delay_ms = delay.as_millis() as u64,
                "Notification stream failed, reconnecting after backoff",
            );

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.state.send_replace(ConnectionState::Stopped);
        tracing::debug!(url = %self.config.url, "Notification stream stopped");
    }

    /// Run one connection until it fails. Always ends in an error: a stream
    /// that the server closes cleanly still has to be re-established.
    async fn stream_once<H: StreamHandler>(
        &self,
        handler: &mut H,
        backoff: &mut Backoff,
    ) -> StreamError {
        let response = match self
            .http
            .get(&self.config.url)
            .bearer_auth(&self.config.token)
            .header(ACCEPT, EVENT_STREAM_MIME)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return StreamError::Connection(e),
        };

        let status = response.status();
        if !status.is_success() {
            return StreamError::Status {
                status: status.as_u16(),
            };
        }
        if response.content_length() == Some(0) {
            return StreamError::NoBody;
        }

        self.state.send_replace(ConnectionState::Streaming);
        tracing::info!(url = %self.config.url, "Notification stream connected");

        let mut parser = FrameParser::new();
        let mut body = response.bytes_stream();
        let mut first_read = true;

        loop {
            let chunk = match body.next().await {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return StreamError::Read(e),
                None => return StreamError::Closed,
            };

            if first_read {
                backoff.reset();
                first_read = false;
            }

            for frame in parser.push(&chunk) {
                if self.cancel.is_cancelled() {
                    return StreamError::Closed;
                }
                match frame {
                    ParsedFrame::Event(event) => {
                        if let Err(e) = handler.on_event(event) {
                            if self.cancel.is_cancelled() {
                                return StreamError::Closed;
                            }
                            handler.on_error(&StreamError::Handler(e));
                        }
                    }
                    ParsedFrame::KeepAlive => {
                        tracing::trace!(url = %self.config.url, "Keep-alive received");
                    }
                    ParsedFrame::Dropped { event_type } => {
                        tracing::debug!(
                            url = %self.config.url,
                            event_type = %event_type,
                            "Dropping frame without data",
                        );
                    }
                    ParsedFrame::Overflow { discarded } => {
                        tracing::warn!(
                            url = %self.config.url,
                            discarded,
                            "Discarding oversized frame",
                        );
                    }
                }
            }
        }
    }
}
