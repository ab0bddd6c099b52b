//! Session manager
//!
//! `SessionManager` is the public face of the crate: it owns the state
//! machine, the outbound queue, and the run loop that dials, reads, and
//! retries. One instance per logical connection; there is no process-wide
//! state.
//!
//! # Lifecycle
//!
//! 1. **connect(url)**: spawns the run loop; idempotent while a connection
//!    is pending or open
//! 2. **send / on_message**: exchange messages; sends issued while
//!    disconnected are queued and drained FIFO when the connection opens
//! 3. **close()**: tears the connection down, cancels any pending retry,
//!    keeps the queue for a later `connect()`
//!
//! # Cloning
//!
//! `SessionManager` is cheaply cloneable using `Arc` internally. All clones
//! share the same connection, queue, and handlers.
//!
//! # Failure model
//!
//! The caller is never blocked and nothing here panics the session: dial
//! failures and dropped connections feed the backoff loop, undecodable
//! frames become dead-letter events, and exhaustion is reported exactly once
//! per run through the event channel.

use crate::backoff::ExponentialBackoff;
use crate::dispatch::Dispatcher;
use crate::event::SessionEvent;
use crate::queue::OutboundQueue;
use crate::state::{SessionState, StateTracker};
use crate::transport::{Connector, TransportSink, TransportStream, WsConnector};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use wsession_core::{codec, Error, Message, Result};

pub(crate) struct SessionShared {
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) tracker: Arc<StateTracker>,
    pub(crate) queue: Mutex<OutboundQueue>,
    pub(crate) sink: Mutex<Option<Box<dyn TransportSink>>>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) connect_timeout: Duration,
}

/// Resilient WebSocket client session
///
/// See the [module docs](self) for the lifecycle. Construct via
/// [`SessionManager::new`] for defaults or [`crate::SessionBuilder`] for
/// configuration.
#[derive(Clone)]
pub struct SessionManager {
    pub(crate) inner: Arc<SessionShared>,
}

impl SessionManager {
    /// Create a session with default configuration
    ///
    /// Exponential backoff from 500ms to 30s with unlimited attempts, a 10s
    /// connect timeout, and an unbounded outbound queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionShared {
                connector: Arc::new(WsConnector),
                tracker: StateTracker::new(Box::new(ExponentialBackoff::default())),
                queue: Mutex::new(OutboundQueue::new()),
                sink: Mutex::new(None),
                dispatcher: Dispatcher::new(),
                connect_timeout: Duration::from_secs(10),
            }),
        }
    }

    /// Current session state
    pub async fn state(&self) -> SessionState {
        self.inner.tracker.state().await
    }

    /// Whether the session is currently open
    pub async fn is_open(&self) -> bool {
        self.state().await == SessionState::Open
    }

    /// Number of messages waiting in the outbound queue
    pub async fn queued(&self) -> usize {
        self.inner.queue.lock().await.len()
    }

    /// Register a handler invoked for every decoded inbound message
    ///
    /// Handlers are invoked in arrival order; all registered handlers run
    /// for every message, even if one of them panics.
    pub async fn on_message<F, Fut>(&self, handler: F)
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.dispatcher.on_message(handler).await;
    }

    /// Register a listener for session events
    ///
    /// Events carry everything the session recovers from on its own:
    /// overflow drops, dead-lettered frames, state changes, exhaustion.
    pub async fn on_event<F, Fut>(&self, listener: F)
    where
        F: Fn(SessionEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.dispatcher.on_event(listener).await;
    }

    /// Open the session against `url`
    ///
    /// Idempotent while Connecting or Open. Returns immediately; the dial
    /// happens on the spawned run loop and failures surface through events
    /// and the retry policy. A new `connect()` after close or exhaustion
    /// starts a fresh run with a reset policy.
    pub async fn connect(&self, url: impl Into<String>) {
        let state = self.inner.tracker.state().await;
        if matches!(state, SessionState::Connecting | SessionState::Open) {
            tracing::debug!("connect ignored, session already connecting or open");
            return;
        }

        // New generation: a stale run loop or retry timer from a previous
        // connect/close must not transition the state machine anymore
        let epoch = self.inner.tracker.bump_epoch();
        self.inner.tracker.reset_policy().await;
        Self::transition(&self.inner, SessionState::Connecting).await;

        let shared = Arc::clone(&self.inner);
        let url = url.into();
        tokio::spawn(Self::run_loop(shared, url, epoch));
    }

    /// Send a message, queueing it if the session is not open
    ///
    /// Never fails for transient disconnection: while not Open the message
    /// is enqueued FIFO and transmitted on the next Open. While Open, any
    /// messages requeued by an earlier transmit failure are flushed first so
    /// call order holds even when the stream has not dropped yet. A transmit
    /// failure requeues the message at the front. The only error is
    /// `Error::Encode` for a payload that cannot be serialized.
    pub async fn send(&self, msg: Message) -> Result<()> {
        // Validate encodability up front; this is the one synchronous error
        let text = codec::encode(&msg)?;

        // The queue lock is taken before the state check. The run loop flips
        // the state to Open while holding this lock with the queue empty, so
        // a send can never land between "queue drained" and "Open visible".
        let mut queue = self.inner.queue.lock().await;
        let open = self.inner.tracker.state().await == SessionState::Open;
        let mut dead_letters = Vec::new();

        let leftover = if open {
            Self::try_transmit(&self.inner, &mut queue, msg, text, &mut dead_letters).await
        } else {
            Some(msg)
        };

        let dropped = leftover.and_then(|msg| queue.push(msg));
        drop(queue);
        self.emit_dead_letters(dead_letters).await;
        if let Some(dropped) = dropped {
            tracing::warn!(kind = %dropped.kind, "outbound queue full, dropping oldest");
            self.inner
                .dispatcher
                .emit(SessionEvent::Overflow { dropped })
                .await;
        }
        Ok(())
    }

    /// Flush the queue, then transmit `msg`, on an open sink
    ///
    /// Returns the message back when it could not be handed to the sink (the
    /// flush stalled or the sink was already torn down); the caller enqueues
    /// it behind the stalled head to preserve call order. A direct transmit
    /// failure requeues `msg` at the front of the (empty) queue and consumes
    /// it. Unencodable queued messages are collected into `dead_letters` for
    /// the caller to report once the locks are released.
    async fn try_transmit(
        shared: &SessionShared,
        queue: &mut OutboundQueue,
        msg: Message,
        text: String,
        dead_letters: &mut Vec<(String, Error)>,
    ) -> Option<Message> {
        let mut sink = shared.sink.lock().await;
        let s = match sink.as_mut() {
            Some(s) => s,
            // Sink already torn down by a racing disconnect
            None => return Some(msg),
        };

        while let Some(queued) = queue.pop_front() {
            let queued_text = match codec::encode(&queued) {
                Ok(text) => text,
                Err(e) => {
                    dead_letters.push((format!("{:?}", queued), e));
                    continue;
                }
            };
            if let Err(e) = s.send(queued_text).await {
                tracing::warn!(kind = %queued.kind, error = %e, "transmit failed, requeuing");
                queue.requeue_front(queued);
                return Some(msg);
            }
        }

        if let Err(e) = s.send(text).await {
            // Transient: keep the message, the read loop will notice the
            // drop and drive the retry cycle
            tracing::warn!(kind = %msg.kind, error = %e, "transmit failed, requeuing");
            queue.requeue_front(msg);
        }
        None
    }

    async fn emit_dead_letters(&self, dead_letters: Vec<(String, Error)>) {
        for (frame, error) in dead_letters {
            tracing::warn!(error = %error, "dropping unencodable queued message");
            self.inner
                .dispatcher
                .emit(SessionEvent::DeadLetter { frame, error })
                .await;
        }
    }

    /// Close the session
    ///
    /// Cancels any in-flight connect attempt and pending retry timer,
    /// closes the transport if open, and leaves the outbound queue intact
    /// for a subsequent `connect()`.
    pub async fn close(&self) {
        // Invalidate the live run loop before touching state
        self.inner.tracker.bump_epoch();

        match self.inner.tracker.state().await {
            SessionState::Open => {
                Self::transition(&self.inner, SessionState::Closing).await;
                if let Some(mut sink) = self.inner.sink.lock().await.take() {
                    if let Err(e) = sink.close().await {
                        tracing::debug!(error = %e, "error closing transport");
                    }
                }
                Self::transition(&self.inner, SessionState::Disconnected).await;
                tracing::info!("session closed");
            }
            SessionState::Connecting | SessionState::Failed { .. } => {
                self.inner.sink.lock().await.take();
                Self::transition(&self.inner, SessionState::Disconnected).await;
                tracing::info!("pending connect cancelled");
            }
            SessionState::Disconnected | SessionState::Closing => {}
        }
    }

    async fn transition(shared: &Arc<SessionShared>, state: SessionState) {
        shared.tracker.set_state(state.clone()).await;
        shared
            .dispatcher
            .emit(SessionEvent::StateChanged(state))
            .await;
    }

    /// Connect, drain, read, retry: one task per `connect()` generation
    async fn run_loop(shared: Arc<SessionShared>, url: String, epoch: u64) {
        // Consecutive failed attempts in this run; reset on every Open
        let mut attempt: u32 = 0;

        loop {
            tracing::info!(url = %url, attempt, "connecting");
            let dial = tokio::time::timeout(
                shared.connect_timeout,
                shared.connector.connect(&url),
            )
            .await;

            if !shared.tracker.is_current(epoch) {
                return;
            }

            let dialed = match dial {
                Ok(Ok(pair)) => Ok(pair),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(Error::Timeout),
            };

            match dialed {
                Ok((sink, mut stream)) => {
                    *shared.sink.lock().await = Some(sink);

                    match Self::drain_and_open(&shared, epoch).await {
                        Ok(()) => {
                            if !shared.tracker.is_current(epoch) {
                                return;
                            }
                            attempt = 0;
                            tracing::info!("session open");
                            shared
                                .dispatcher
                                .emit(SessionEvent::StateChanged(SessionState::Open))
                                .await;

                            Self::read_loop(&shared, stream.as_mut(), epoch).await;
                            if !shared.tracker.is_current(epoch) {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "transmit failed while draining queue");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "connect attempt failed");
                }
            }

            if !shared.tracker.is_current(epoch) {
                return;
            }
            shared.sink.lock().await.take();

            Self::transition(&shared, SessionState::Failed { attempt }).await;
            match shared.tracker.next_retry_delay().await {
                Some(delay) => {
                    attempt += 1;
                    tracing::info!(
                        delay_ms = delay.as_millis() as u64,
                        attempt,
                        "retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    if !shared.tracker.is_current(epoch) {
                        return;
                    }
                    Self::transition(&shared, SessionState::Connecting).await;
                }
                None => {
                    tracing::error!("retry attempts exhausted");
                    shared
                        .dispatcher
                        .emit(SessionEvent::StateChanged(SessionState::Disconnected))
                        .await;
                    shared.dispatcher.emit(SessionEvent::Exhausted).await;
                    return;
                }
            }
        }
    }

    /// Drain the outbound queue FIFO, then flip the state to Open
    ///
    /// Stops at the first failed transmit, leaving that message and the
    /// remainder queued in order. The Open transition happens while the
    /// queue lock is held with the queue empty (see `send()`) and goes
    /// through `mark_open_if_current`, which compares the epoch under the
    /// state write lock so a concurrent `close()` cannot be overtaken by a
    /// stale Open.
    async fn drain_and_open(shared: &Arc<SessionShared>, epoch: u64) -> Result<()> {
        loop {
            let mut queue = shared.queue.lock().await;
            if !shared.tracker.is_current(epoch) {
                return Err(Error::Closed);
            }
            let msg = match queue.pop_front() {
                Some(msg) => msg,
                None => {
                    if !shared.tracker.mark_open_if_current(epoch).await {
                        return Err(Error::Closed);
                    }
                    return Ok(());
                }
            };

            let text = match codec::encode(&msg) {
                Ok(text) => text,
                Err(e) => {
                    // Unserializable message in the queue: dead-letter it
                    // and keep draining
                    drop(queue);
                    tracing::warn!(kind = %msg.kind, error = %e, "dropping unencodable queued message");
                    shared
                        .dispatcher
                        .emit(SessionEvent::DeadLetter {
                            frame: format!("{:?}", msg),
                            error: e,
                        })
                        .await;
                    continue;
                }
            };

            let mut sink = shared.sink.lock().await;
            match sink.as_mut() {
                Some(s) => {
                    if let Err(e) = s.send(text).await {
                        queue.requeue_front(msg);
                        return Err(e);
                    }
                }
                None => {
                    queue.requeue_front(msg);
                    return Err(Error::Closed);
                }
            }
        }
    }

    /// Dispatch inbound frames until the connection drops or the epoch goes stale
    async fn read_loop(
        shared: &Arc<SessionShared>,
        stream: &mut dyn TransportStream,
        epoch: u64,
    ) {
        loop {
            let next = stream.next().await;
            if !shared.tracker.is_current(epoch) {
                return;
            }
            match next {
                Some(Ok(text)) => match codec::decode(&text) {
                    Ok(msg) => {
                        tracing::debug!(kind = %msg.kind, "message received");
                        shared.dispatcher.dispatch(msg).await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping undecodable frame");
                        shared
                            .dispatcher
                            .emit(SessionEvent::DeadLetter {
                                frame: text,
                                error: e,
                            })
                            .await;
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "transport error");
                    return;
                }
                None => {
                    tracing::info!("connection closed by peer");
                    return;
                }
            }
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
