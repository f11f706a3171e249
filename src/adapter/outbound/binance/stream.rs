//! Websocket transport for the announcement feed.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace};

use super::message::{decode, SubscribeCommand};
use crate::error::{ConnectionError, Result};
use crate::port::{FeedEvent, FeedStream, SignedRequest};

/// Header carrying the public API key.
const API_KEY_HEADER: &str = "X-MBX-APIKEY";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`FeedStream`] over tokio-tungstenite.
///
/// Holds at most one socket; `connect` drops any previous one first.
#[derive(Default)]
pub struct WsFeedStream {
    socket: Option<Socket>,
}

impl WsFeedStream {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn socket(&mut self) -> Result<&mut Socket> {
        self.socket
            .as_mut()
            .ok_or_else(|| ConnectionError::NotConnected.into())
    }
}

#[async_trait]
impl FeedStream for WsFeedStream {
    async fn connect(&mut self, request: &SignedRequest) -> Result<()> {
        self.socket = None;

        let mut http = request.url.as_str().into_client_request()?;
        let key = HeaderValue::from_str(&request.api_key)
            .map_err(|e| ConnectionError::Transport(format!("invalid api key header: {e}")))?;
        http.headers_mut().insert(API_KEY_HEADER, key);

        let (socket, response) = connect_async(http).await?;
        info!(status = %response.status(), "WebSocket connected");
        self.socket = Some(socket);
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<()> {
        let json = serde_json::to_string(&SubscribeCommand::new(topic))?;
        info!(%topic, "Subscribing to topic");
        self.socket()?.send(Message::Text(json)).await?;
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        self.socket()?.send(Message::Ping(Vec::new())).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        loop {
            let socket = self.socket.as_mut()?;
            match socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    trace!(bytes = text.len(), "Received WebSocket text frame");
                    return Some(match decode(&text) {
                        Ok(message) => FeedEvent::Message(message),
                        Err(e) => FeedEvent::Malformed {
                            error: e.to_string(),
                        },
                    });
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = socket.send(Message::Pong(data)).await {
                        self.socket = None;
                        return Some(FeedEvent::Error(e.to_string()));
                    }
                }
                Some(Ok(Message::Pong(_))) => return Some(FeedEvent::Pong),
                Some(Ok(Message::Close(frame))) => {
                    self.socket = None;
                    let (code, reason) = frame
                        .map(|f| (Some(u16::from(f.code)), f.reason.into_owned()))
                        .unwrap_or((None, String::new()));
                    return Some(FeedEvent::Closed { code, reason });
                }
                Some(Ok(_)) => debug!("Ignoring non-text frame"),
                Some(Err(e)) => {
                    self.socket = None;
                    return Some(FeedEvent::Error(e.to_string()));
                }
                None => {
                    self.socket = None;
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut socket) = self.socket.take() else {
            return Ok(());
        };
        socket
            .close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            }))
            .await?;
        Ok(())
    }
}
