//! Resilient WebSocket client session manager
//!
//! This crate turns "open a socket, send a message, react to messages" into
//! something fit for production:
//!
//! - **Reconnect with backoff**: dial failures and dropped connections feed
//!   a configurable retry policy (exponential backoff with jitter by default)
//! - **Outbound queuing**: messages sent while disconnected are buffered
//!   FIFO and drained, in order, as soon as the connection opens
//! - **Typed dispatch**: inbound JSON frames decode into tagged messages and
//!   fan out to registered async handlers in arrival order
//! - **Event channel**: everything the session recovers from on its own
//!   (overflow drops, dead-lettered frames, exhaustion, state changes) is
//!   reported asynchronously, never thrown at the caller
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use wsession_client::SessionManager;
//! use wsession_core::Message;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = SessionManager::new();
//!
//!     session
//!         .on_message(|msg| async move {
//!             println!("received {}: {:?}", msg.kind, msg.payload);
//!         })
//!         .await;
//!
//!     // Queued until the connection opens, then transmitted first
//!     session
//!         .send(
//!             Message::new("chat")
//!                 .with("subsystem", json!("engine"))
//!                 .with("message", json!("temperature warning light stays on")),
//!         )
//!         .await?;
//!
//!     session.connect("ws://localhost:8080/ws").await;
//!     Ok(())
//! }
//! ```
//!
//! # With a bounded queue and capped retries
//!
//! ```rust,no_run
//! use wsession_client::{SessionBuilder, ExponentialBackoff};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let session = SessionBuilder::new()
//!     .with_backoff(Box::new(
//!         ExponentialBackoff::new(Duration::from_millis(500), Duration::from_secs(30))
//!             .with_max_attempts(10),
//!     ))
//!     .with_queue_capacity(256)
//!     .build();
//!
//! session.connect("ws://localhost:8080/ws").await;
//! # }
//! ```

mod backoff;
mod builder;
mod dispatch;
mod event;
mod queue;
mod session;
mod state;
mod transport;

pub use backoff::{BackoffPolicy, ExponentialBackoff, FixedDelay, NoRetry};
pub use builder::SessionBuilder;
pub use dispatch::Dispatcher;
pub use event::SessionEvent;
pub use queue::OutboundQueue;
pub use session::SessionManager;
pub use state::{SessionState, StateTracker};
pub use transport::{Connector, TransportSink, TransportStream, WsConnector};
