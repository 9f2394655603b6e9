//! [`Transport`] over WebSocket, on `tokio-tungstenite`.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{Connection, ConnectionId, Transport, TransportError};

static CONNECTION_SEQ: AtomicU64 = AtomicU64::new(1);

type Socket = WebSocketStream<TcpStream>;

/// Listens for clients and upgrades each TCP stream to a WebSocket.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "listening for WebSocket clients");
        Ok(Self { listener })
    }

    /// The bound address; useful after binding port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<WebSocketConnection, TransportError> {
        let (tcp, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        let socket = tokio_tungstenite::accept_async(tcp)
            .await
            .map_err(|e| TransportError::AcceptFailed(io::Error::new(io::ErrorKind::ConnectionRefused, e)))?;

        let id = ConnectionId::new(CONNECTION_SEQ.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "WebSocket handshake complete");
        Ok(WebSocketConnection::new(id, socket))
    }
}

/// One upgraded client socket.
///
/// The sink and the stream sit behind separate locks, so a pending
/// `recv` never holds up frames queued for this client.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<Socket, Message>>,
    stream: Mutex<SplitStream<Socket>>,
}

impl WebSocketConnection {
    fn new(id: ConnectionId, socket: Socket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

fn send_error(e: tungstenite::Error) -> TransportError {
    TransportError::SendFailed(io::Error::new(io::ErrorKind::BrokenPipe, e))
}

/// What one incoming message means for `recv`: `None` to keep reading.
fn classify(msg: Message) -> Option<Result<Option<String>, TransportError>> {
    match msg {
        Message::Text(text) => Some(Ok(Some(text.as_str().to_owned()))),
        Message::Binary(bytes) => Some(
            String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| TransportError::InvalidFrame),
        ),
        Message::Close(_) => Some(Ok(None)),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, text: &str) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::text(text.to_owned())).await.map_err(send_error)
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        let mut stream = self.stream.lock().await;
        while let Some(next) = stream.next().await {
            let msg = next.map_err(|e| {
                TransportError::ReceiveFailed(io::Error::new(io::ErrorKind::ConnectionReset, e))
            })?;
            if let Some(outcome) = classify(msg) {
                return outcome;
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await.map_err(send_error)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_text_frame() {
        let out = classify(Message::text("hi")).expect("terminal");
        assert_eq!(out.expect("ok"), Some("hi".to_string()));
    }

    #[test]
    fn test_classify_rejects_non_utf8_binary() {
        let out = classify(Message::binary(vec![0xff, 0xfe])).expect("terminal");
        assert!(matches!(out, Err(TransportError::InvalidFrame)));
    }

    #[test]
    fn test_classify_skips_control_frames() {
        assert!(classify(Message::Ping(Vec::new().into())).is_none());
        assert!(classify(Message::Pong(Vec::new().into())).is_none());
    }

    #[test]
    fn test_classify_close_ends_stream() {
        let out = classify(Message::Close(None)).expect("terminal");
        assert_eq!(out.expect("ok"), None);
    }
}
