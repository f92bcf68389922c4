//! WebSocket push transport
//!
//! Connects to the server's notification bridge, subscribes to the user's
//! four topics, and turns inbound frames into `PushEvent`s. Frames are a
//! small JSON envelope: `{"topic": "...", "body": "..."}` where `body`
//! carries the topic's payload verbatim. The transport handles exactly one
//! connection attempt per `connect` call; reconnection policy lives in the
//! runtime's channel task.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

use notisync_core::{
    NotificationTopic, PushEvent, PushTransport, Result, SyncError, TransportError, UserId,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ----------------------------------------------------------------------------
// Wire Frames
// ----------------------------------------------------------------------------

/// Inbound envelope delivered by the bridge
#[derive(Debug, Deserialize)]
struct TopicFrame {
    topic: String,
    body: String,
}

/// Outbound subscription request, sent once per connection
#[derive(Debug, Serialize)]
struct SubscribeFrame {
    subscribe: Vec<String>,
}

/// Decode one text frame into an event. `Ok(None)` means the frame belongs
/// to a topic outside this user's subscription and should be skipped. A
/// frame that is not a valid envelope is a protocol error; a valid envelope
/// with a bad body is a payload error.
fn decode_frame(text: &str, user: UserId) -> Result<Option<PushEvent>> {
    let frame: TopicFrame = serde_json::from_str(text)
        .map_err(|e| SyncError::protocol(format!("bad envelope: {}", e)))?;
    match NotificationTopic::from_path(&frame.topic, user) {
        Some(topic) => PushEvent::decode(topic, &frame.body).map(Some),
        None => Ok(None),
    }
}

// ----------------------------------------------------------------------------
// WebSocket Transport
// ----------------------------------------------------------------------------

/// Push transport over a WebSocket connection to the notification bridge
pub struct WebSocketTransport {
    endpoint: Url,
    user: Option<UserId>,
    socket: Option<Socket>,
}

impl WebSocketTransport {
    /// Build a transport for the given bridge endpoint, e.g. `ws://host/ws`
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            user: None,
            socket: None,
        }
    }
}

#[async_trait]
impl PushTransport for WebSocketTransport {
    async fn connect(&mut self, user: UserId) -> Result<()> {
        let (mut socket, _response) = connect_async(self.endpoint.as_str())
            .await
            .map_err(|e| SyncError::connection_failed(e.to_string()))?;

        let subscribe = SubscribeFrame {
            subscribe: NotificationTopic::ALL
                .iter()
                .map(|topic| topic.path(user))
                .collect(),
        };
        let frame = serde_json::to_string(&subscribe)?;
        socket
            .send(Message::Text(frame))
            .await
            .map_err(|e| SyncError::connection_failed(e.to_string()))?;

        debug!(user = %user, endpoint = %self.endpoint, "WebSocket subscribed");
        self.user = Some(user);
        self.socket = Some(socket);
        Ok(())
    }

    async fn next_event(&mut self) -> Result<PushEvent> {
        let user = self
            .user
            .ok_or(SyncError::Transport(TransportError::NotConnected))?;
        let socket = self
            .socket
            .as_mut()
            .ok_or(SyncError::Transport(TransportError::NotConnected))?;

        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => match decode_frame(&text, user) {
                    Ok(Some(event)) => return Ok(event),
                    Ok(None) => {
                        debug!("Skipping frame for foreign topic");
                    }
                    Err(e) => {
                        // One bad frame must not cost the connection.
                        warn!(error = %e, "Dropping malformed frame");
                    }
                },
                Some(Ok(Message::Ping(payload))) => {
                    socket
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| SyncError::connection_closed(e.to_string()))?;
                }
                Some(Ok(Message::Close(_))) => {
                    return Err(SyncError::connection_closed("server closed the connection"));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Err(SyncError::connection_closed(e.to_string()));
                }
                None => {
                    return Err(SyncError::connection_closed("stream ended"));
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.user = None;
        if let Some(mut socket) = self.socket.take() {
            // The peer may already be gone; a failed close is fine.
            if let Err(e) = socket.close(None).await {
                debug!(error = %e, "WebSocket close failed");
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use notisync_core::NotificationId;

    #[test]
    fn test_decode_created_frame() {
        let text = r#"{"topic": "/topic/notifications/7", "body": "{\"id\": 3, \"title\": \"hi\"}"}"#;
        match decode_frame(text, UserId(7)).unwrap() {
            Some(PushEvent::Created(raw)) => assert_eq!(raw.id, NotificationId(3)),
            other => panic!("unexpected decode result: {:?}", other),
        }
    }

    #[test]
    fn test_decode_read_frame() {
        let text = r#"{"topic": "/topic/notifications/7/read", "body": "9"}"#;
        assert_eq!(
            decode_frame(text, UserId(7)).unwrap(),
            Some(PushEvent::Read(NotificationId(9)))
        );
    }

    #[test]
    fn test_foreign_topic_is_skipped() {
        let text = r#"{"topic": "/topic/notifications/8", "body": "{\"id\": 1}"}"#;
        assert_eq!(decode_frame(text, UserId(7)).unwrap(), None);
        let text = r#"{"topic": "/queue/other", "body": ""}"#;
        assert_eq!(decode_frame(text, UserId(7)).unwrap(), None);
    }

    #[test]
    fn test_malformed_envelope_is_protocol_error() {
        assert!(matches!(
            decode_frame("not json", UserId(7)),
            Err(SyncError::Transport(TransportError::Protocol { .. }))
        ));
        // Valid envelope, bad body for the topic: payload error instead.
        let text = r#"{"topic": "/topic/notifications/7/read", "body": "not-an-id"}"#;
        assert!(matches!(
            decode_frame(text, UserId(7)),
            Err(SyncError::Payload(_))
        ));
    }

    #[tokio::test]
    async fn test_next_event_before_connect_is_not_connected() {
        let mut transport = WebSocketTransport::new(Url::parse("ws://localhost:9/ws").unwrap());
        assert!(matches!(
            transport.next_event().await,
            Err(SyncError::Transport(TransportError::NotConnected))
        ));
    }

    #[tokio::test]
    async fn test_close_without_connection_is_idempotent() {
        let mut transport = WebSocketTransport::new(Url::parse("ws://localhost:9/ws").unwrap());
        assert!(transport.close().await.is_ok());
        assert!(transport.close().await.is_ok());
    }
}
