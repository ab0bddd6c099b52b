//! Session builder
//!
//! Fluent configuration for a `SessionManager` before it dials anything.
//! All knobs are optional:
//!
//! - backoff policy (default: jittered exponential, 500ms to 30s, unlimited)
//! - connect timeout (default: 10s; expiry behaves like a transport error)
//! - outbound queue capacity (default: unbounded; drop-oldest when full)
//! - connector (default: the tokio-tungstenite WebSocket connector; swap in
//!   an in-memory one for tests)
//!
//! # Examples
//!
//! ```rust,no_run
//! use wsession_client::{SessionBuilder, ExponentialBackoff};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let session = SessionBuilder::new()
//!     .with_backoff(Box::new(
//!         ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(5))
//!             .with_max_attempts(10),
//!     ))
//!     .with_connect_timeout(Duration::from_secs(3))
//!     .with_queue_capacity(1024)
//!     .build();
//!
//! session.connect("ws://localhost:8080/ws").await;
//! # }
//! ```

use crate::backoff::{BackoffPolicy, ExponentialBackoff};
use crate::dispatch::Dispatcher;
use crate::queue::OutboundQueue;
use crate::session::{SessionManager, SessionShared};
use crate::state::StateTracker;
use crate::transport::{Connector, WsConnector};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Builder for configuring and creating a `SessionManager`
pub struct SessionBuilder {
    backoff: Option<Box<dyn BackoffPolicy>>,
    connect_timeout: Duration,
    queue_capacity: Option<usize>,
    connector: Option<Arc<dyn Connector>>,
}

impl SessionBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self {
            backoff: None,
            connect_timeout: Duration::from_secs(10),
            queue_capacity: None,
            connector: None,
        }
    }

    /// Set the retry backoff policy
    pub fn with_backoff(mut self, policy: Box<dyn BackoffPolicy>) -> Self {
        self.backoff = Some(policy);
        self
    }

    /// Set the connect timeout
    ///
    /// An attempt that has not completed within this duration counts as a
    /// failed attempt and feeds the backoff loop.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound the outbound queue
    ///
    /// When full, pushing drops the oldest queued message and reports it as
    /// an `Overflow` event.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Use a custom transport connector
    ///
    /// The production default is the WebSocket connector; tests substitute
    /// in-memory transports here.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build the session (does not dial; call `connect(url)` to open it)
    pub fn build(self) -> SessionManager {
        let policy = self
            .backoff
            .unwrap_or_else(|| Box::new(ExponentialBackoff::default()));
        let connector = self.connector.unwrap_or_else(|| Arc::new(WsConnector));
        let queue = match self.queue_capacity {
            Some(cap) => OutboundQueue::with_capacity(cap),
            None => OutboundQueue::new(),
        };

        SessionManager {
            inner: Arc::new(SessionShared {
                connector,
                tracker: StateTracker::new(policy),
                queue: Mutex::new(queue),
                sink: Mutex::new(None),
                dispatcher: Dispatcher::new(),
                connect_timeout: self.connect_timeout,
            }),
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
