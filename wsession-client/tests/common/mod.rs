//! Common test utilities for wsession-client integration tests
//!
//! Two transports are provided:
//!
//! - `ScriptedConnector`: an in-memory connector whose connection attempts
//!   follow a script (refuse, accept, accept-then-close). Deterministic,
//!   used for reconnection and ordering scenarios.
//! - `MockWsServer`: a real WebSocket server for exercising the production
//!   `WsConnector` end to end.

#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use wsession_client::{Connector, TransportSink, TransportStream};
use wsession_core::{Error, Result};

/// Outcome of one scripted connection attempt
pub enum Attempt {
    /// Refuse the connection (dial error)
    Refuse,
    /// Never resolve the dial, forcing the connect timeout to fire
    Hang,
    /// Accept and stay up until the test closes it
    Accept,
    /// Accept, then immediately close from the server side
    AcceptThenClose,
}

enum StreamItem {
    Frame(String),
    Fail(Error),
    Close,
}

struct ConnHandle {
    tx: mpsc::UnboundedSender<StreamItem>,
}

/// In-memory connector driven by a script of attempt outcomes
///
/// Frames the session transmits are observable through the receiver returned
/// by [`ScriptedConnector::new`]; inbound frames and server-side closes are
/// injected with `push_frame` / `close_current`. Attempts beyond the script
/// are accepted.
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Attempt>>,
    sent_tx: mpsc::UnboundedSender<String>,
    conns: Mutex<Vec<ConnHandle>>,
    attempts: AtomicUsize,
    send_failures: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    /// Create a connector; returns it plus a receiver of transmitted frames
    pub fn new(script: Vec<Attempt>) -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                script: Mutex::new(script.into()),
                sent_tx,
                conns: Mutex::new(Vec::new()),
                attempts: AtomicUsize::new(0),
                send_failures: Arc::new(AtomicUsize::new(0)),
            }),
            sent_rx,
        )
    }

    /// Total connection attempts so far
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Inject an inbound text frame on the most recent connection
    pub async fn push_frame(&self, text: impl Into<String>) {
        let conns = self.conns.lock().await;
        let conn = conns.last().expect("no connection established yet");
        conn.tx.send(StreamItem::Frame(text.into())).unwrap();
    }

    /// Close the most recent connection from the server side
    pub async fn close_current(&self) {
        let conns = self.conns.lock().await;
        if let Some(conn) = conns.last() {
            let _ = conn.tx.send(StreamItem::Close);
        }
    }

    /// Fail the most recent connection with a transport error
    pub async fn fail_current(&self) {
        let conns = self.conns.lock().await;
        if let Some(conn) = conns.last() {
            let _ = conn.tx.send(StreamItem::Fail(Error::Transport("injected".into())));
        }
    }

    /// Make the next `n` sink sends fail without disturbing the stream
    pub fn fail_next_sends(&self, n: usize) {
        self.send_failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        _url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let attempt = self.script.lock().await.pop_front().unwrap_or(Attempt::Accept);

        match attempt {
            Attempt::Refuse => Err(Error::Transport("connection refused".into())),
            Attempt::Hang => {
                std::future::pending().await
            }
            Attempt::Accept | Attempt::AcceptThenClose => {
                let (tx, rx) = mpsc::unbounded_channel();
                if matches!(attempt, Attempt::AcceptThenClose) {
                    let _ = tx.send(StreamItem::Close);
                }
                self.conns.lock().await.push(ConnHandle { tx: tx.clone() });
                Ok((
                    Box::new(ScriptedSink {
                        sent: self.sent_tx.clone(),
                        ctrl: tx,
                        send_failures: Arc::clone(&self.send_failures),
                    }),
                    Box::new(ScriptedStream { rx }),
                ))
            }
        }
    }
}

struct ScriptedSink {
    sent: mpsc::UnboundedSender<String>,
    ctrl: mpsc::UnboundedSender<StreamItem>,
    send_failures: Arc<AtomicUsize>,
}

#[async_trait]
impl TransportSink for ScriptedSink {
    async fn send(&mut self, text: String) -> Result<()> {
        if self
            .send_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Transport("injected sink failure".into()));
        }
        self.sent
            .send(text)
            .map_err(|_| Error::Transport("sink closed".into()))
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.ctrl.send(StreamItem::Close);
        Ok(())
    }
}

struct ScriptedStream {
    rx: mpsc::UnboundedReceiver<StreamItem>,
}

#[async_trait]
impl TransportStream for ScriptedStream {
    async fn next(&mut self) -> Option<Result<String>> {
        match self.rx.recv().await {
            Some(StreamItem::Frame(text)) => Some(Ok(text)),
            Some(StreamItem::Fail(e)) => Some(Err(e)),
            Some(StreamItem::Close) | None => None,
        }
    }
}

/// Poll `predicate` until it holds or `timeout` elapses
pub async fn wait_for<F, Fut>(timeout: Duration, mut predicate: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if predicate().await {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {:?}",
            timeout
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Receive the next transmitted frame or panic after a timeout
pub async fn recv_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for transmitted frame")
        .expect("frame channel closed")
}

/// Mock WebSocket server for exercising the production connector
///
/// Accepts connections and echoes every text frame back to the client.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
}

impl MockWsServer {
    /// Start an echo server on an ephemeral port
    pub async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accept_result = listener.accept() => {
                        if let Ok((stream, _)) = accept_result {
                            tokio::spawn(async move {
                                if let Ok(ws_stream) = accept_async(stream).await {
                                    let (mut write, mut read) = ws_stream.split();
                                    while let Some(Ok(msg)) = read.next().await {
                                        if let WsMessage::Text(text) = msg {
                                            if write.send(WsMessage::Text(text)).await.is_err() {
                                                break;
                                            }
                                        }
                                    }
                                }
                            });
                        }
                    }
                }
            }
        });

        Self { addr, shutdown_tx }
    }

    /// The ws:// URL of this server
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Stop accepting connections
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
