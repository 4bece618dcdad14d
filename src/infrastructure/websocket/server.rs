use crate::application::streaming::broadcaster::SubscriptionBroadcaster;
use crate::application::streaming::scheduler::ShutdownSignal;
use crate::application::streaming::symbol_registry::{SymbolRegistry, normalize_symbol};
use crate::domain::ports::Subscriber;
use crate::infrastructure::websocket::subscriber::WebSocketSubscriber;
use futures_util::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{debug, info, warn};

pub const STREAM_PATH: &str = "/ws/stream";

/// Why a handshake was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeRejection {
    #[error("Unknown path {0}")]
    UnknownPath(String),

    #[error("Missing symbol query parameter")]
    MissingSymbol,

    #[error("Symbol {0} is not tracked")]
    UntrackedSymbol(String),
}

impl HandshakeRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownPath(_) | Self::UntrackedSymbol(_) => StatusCode::NOT_FOUND,
            Self::MissingSymbol => StatusCode::BAD_REQUEST,
        }
    }

    fn into_response(self) -> ErrorResponse {
        let status = self.status();
        let mut response = ErrorResponse::new(Some(self.to_string()));
        *response.status_mut() = status;
        response
    }
}

/// Maps a handshake target like `/ws/stream?symbol=aapl` to a tracked symbol.
pub fn resolve_stream_symbol(
    path: &str,
    query: Option<&str>,
    registry: &SymbolRegistry,
) -> Result<String, HandshakeRejection> {
    if path != STREAM_PATH {
        return Err(HandshakeRejection::UnknownPath(path.to_string()));
    }

    let raw = query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "symbol")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|s| !s.trim().is_empty())
        .ok_or(HandshakeRejection::MissingSymbol)?;

    let symbol = normalize_symbol(&raw);
    if registry.contains(&symbol) {
        Ok(symbol)
    } else {
        Err(HandshakeRejection::UntrackedSymbol(symbol))
    }
}

/// Accepts subscriber connections and hands them to the broadcaster.
#[derive(Clone)]
pub struct TickStreamServer {
    registry: Arc<SymbolRegistry>,
    broadcaster: Arc<SubscriptionBroadcaster>,
}

impl TickStreamServer {
    pub fn new(registry: Arc<SymbolRegistry>, broadcaster: Arc<SubscriptionBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    pub async fn bind(address: &str) -> std::io::Result<TcpListener> {
        let listener = TcpListener::bind(address).await?;
        info!("Tick stream listening on ws://{}{}", listener.local_addr()?, STREAM_PATH);
        Ok(listener)
    }

    /// Accept loop; each connection runs on its own task until the peer leaves.
    pub async fn serve(&self, listener: TcpListener, mut shutdown: ShutdownSignal) {
        loop {
            tokio::select! {
                _ = shutdown.triggered() => {
                    info!("Tick stream server stopping");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let server = self.clone();
                        tokio::spawn(async move {
                            server.handle_connection(stream, peer).await;
                        });
                    }
                    Err(e) => warn!("Failed to accept connection: {}", e),
                },
            }
        }
    }

    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let mut resolved = None;
        let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            let uri = request.uri();
            match resolve_stream_symbol(uri.path(), uri.query(), &self.registry) {
                Ok(symbol) => {
                    resolved = Some(symbol);
                    Ok(response)
                }
                Err(rejection) => {
                    info!("Rejected subscriber {}: {}", peer, rejection);
                    Err(rejection.into_response())
                }
            }
        };

        let ws = match accept_hdr_async(stream, callback).await {
            Ok(ws) => ws,
            Err(e) => {
                debug!("Handshake with {} failed: {}", peer, e);
                return;
            }
        };
        let Some(symbol) = resolved else {
            return;
        };

        let (sink, mut incoming) = ws.split();
        let subscriber = Arc::new(WebSocketSubscriber::new(sink));
        self.broadcaster.connect(&symbol, subscriber.clone()).await;
        info!("Subscriber {} ({}) streaming {}", subscriber.id(), peer, symbol);

        // Inbound frames carry nothing; reading only detects the close.
        while let Some(frame) = incoming.next().await {
            match frame {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Subscriber {} read error: {}", subscriber.id(), e);
                    break;
                }
            }
        }

        self.broadcaster.disconnect(&symbol, subscriber.id()).await;
        subscriber.close().await;
    }
}
