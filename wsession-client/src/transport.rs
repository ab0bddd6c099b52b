//! Transport seam
//!
//! The session does not talk to the network directly. It goes through a
//! `Connector` that dials a URL and yields a split sink/stream pair of
//! boxed trait objects. Production uses `WsConnector` (tokio-tungstenite);
//! tests substitute in-memory transports to script connection failures and
//! inbound frames deterministically.
//!
//! The wire unit is one UTF-8 text frame per message. Binary frames, pings
//! and pongs are handled (or ignored) below this seam; a Close frame or a
//! socket error ends the stream.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use wsession_core::{Error, Result};

/// Outbound half of a connected transport
#[async_trait]
pub trait TransportSink: Send {
    /// Transmit one text frame
    async fn send(&mut self, text: String) -> Result<()>;

    /// Close the transport gracefully
    async fn close(&mut self) -> Result<()>;
}

/// Inbound half of a connected transport
#[async_trait]
pub trait TransportStream: Send {
    /// Next inbound text frame
    ///
    /// `None` means the peer closed the connection; `Some(Err(_))` is a
    /// transport failure. Both end the session's read loop.
    async fn next(&mut self) -> Option<Result<String>>;
}

/// Dials a URL and produces a connected transport
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to `url`
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)>;
}

type WsSplitSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSplitStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Production WebSocket connector over tokio-tungstenite
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let (sink, stream) = ws_stream.split();
        Ok((
            Box::new(WsSink { inner: sink }),
            Box::new(WsStream { inner: stream }),
        ))
    }
}

struct WsSink {
    inner: WsSplitSink,
}

#[async_trait]
impl TransportSink for WsSink {
    async fn send(&mut self, text: String) -> Result<()> {
        self.inner
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.inner
            .close()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}

struct WsStream {
    inner: WsSplitStream,
}

#[async_trait]
impl TransportStream for WsStream {
    async fn next(&mut self) -> Option<Result<String>> {
        loop {
            match self.inner.next().await {
                Some(Ok(WsMessage::Text(text))) => return Some(Ok(text)),
                Some(Ok(WsMessage::Close(_))) => return None,
                // Pings are answered by tungstenite; binary frames are not
                // part of the wire format
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Some(Err(Error::Transport(e.to_string()))),
                None => return None,
            }
        }
    }
}
