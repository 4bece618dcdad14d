use crate::domain::errors::DeliveryError;
use crate::domain::ports::{Subscriber, SubscriberId};
use async_trait::async_trait;
use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{self, Message};
use uuid::Uuid;

/// Write half of one client connection
pub struct WebSocketSubscriber<S> {
    id: SubscriberId,
    sink: Mutex<SplitSink<WebSocketStream<S>, Message>>,
}

impl<S> WebSocketSubscriber<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(sink: SplitSink<WebSocketStream<S>, Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sink: Mutex::new(sink),
        }
    }

    /// Best-effort close frame; errors are irrelevant once the peer is leaving.
    pub async fn close(&self) {
        let _ = self.sink.lock().await.close().await;
    }
}

#[async_trait]
impl<S> Subscriber for WebSocketSubscriber<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn id(&self) -> SubscriberId {
        self.id
    }

    async fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::text(payload.to_string()))
            .await
            .map_err(|e| match e {
                tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                    DeliveryError::Closed {
                        subscriber: self.id,
                    }
                }
                other => DeliveryError::Transport {
                    subscriber: self.id,
                    reason: other.to_string(),
                },
            })
    }
}
