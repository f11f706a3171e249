//! Feed transport port.
//!
//! The connection manager drives a [`FeedStream`] through connect, subscribe,
//! probe and close. Implementations decode inbound frames once at the
//! boundary into [`FeedEvent`]s.

use async_trait::async_trait;

use crate::error::Result;

/// A connection request carrying a freshly signed URL.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Full websocket URL including the signed query and `signature`.
    pub url: String,
    /// Public key id sent in the authentication header.
    pub api_key: String,
}

impl std::fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedRequest")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Application-level messages carried in text frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// Reply to a subscribe command.
    SubscribeAck { ok: bool, detail: String },
    /// A data message; `payload` is the JSON-encoded record.
    Data { topic: String, payload: String },
    /// Valid JSON with a shape this client does not handle.
    Unrecognized,
}

/// Everything the manager can observe on an open transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Message(FeedMessage),
    /// A text frame that failed to decode.
    Malformed { error: String },
    /// Acknowledgment of a liveness probe.
    Pong,
    /// The server closed the connection.
    Closed { code: Option<u16>, reason: String },
    /// Transport failure; the connection is unusable.
    Error(String),
}

/// Close code for a deliberate, normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// A single authenticated streaming connection.
///
/// `connect` may be called again after a close to open a fresh transport;
/// implementations drop any previous transport first.
#[async_trait]
pub trait FeedStream: Send {
    /// Open the transport with a signed request.
    async fn connect(&mut self, request: &SignedRequest) -> Result<()>;

    /// Send the subscribe command for `topic`.
    async fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Emit a protocol-level liveness probe.
    async fn ping(&mut self) -> Result<()>;

    /// Wait for the next event. `None` means the transport is gone.
    ///
    /// Must be cancel-safe: the manager polls it inside `select!`.
    async fn next_event(&mut self) -> Option<FeedEvent>;

    /// Close with the normal-closure code and drop the transport.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl FeedStream for Box<dyn FeedStream> {
    async fn connect(&mut self, request: &SignedRequest) -> Result<()> {
        (**self).connect(request).await
    }

    async fn subscribe(&mut self, topic: &str) -> Result<()> {
        (**self).subscribe(topic).await
    }

    async fn ping(&mut self) -> Result<()> {
        (**self).ping().await
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        (**self).next_event().await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}
