//! wsession - resilient WebSocket client sessions
//!
//! This is the convenience crate that re-exports the wsession sub-crates.
//! Use it if you want a single dependency.
//!
//! # Architecture
//!
//! - **wsession-core**: the `Message` type, JSON codec, error taxonomy
//! - **wsession-client**: the session manager, reconnect with backoff,
//!   outbound queuing while disconnected, typed message dispatch
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use wsession::{Message, SessionManager};
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
//!     session.connect("ws://localhost:8080/ws").await;
//!
//!     session
//!         .send(
//!             Message::new("chat")
//!                 .with("subsystem", json!("engine"))
//!                 .with("message", json!("temperature warning light stays on")),
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

// Re-export the public APIs of the sub-crates so everything is reachable
// through the `wsession::` prefix
pub use wsession_client as client;
pub use wsession_core as core;

pub use wsession_client::{
    BackoffPolicy, Connector, ExponentialBackoff, FixedDelay, NoRetry, SessionBuilder,
    SessionEvent, SessionManager, SessionState,
};
pub use wsession_core::{codec, Error, Message, Result};
