//! Handler registries for inbound messages and session events
//!
//! Callers register async handlers; the session invokes them from its run
//! loop. Two guarantees:
//!
//! - **Order**: handlers see inbound messages in wire arrival order. Each
//!   message is fully dispatched before the next one is read.
//! - **Isolation**: every handler runs for every message, even if another
//!   handler panics. A panicking handler is logged and skipped, never
//!   propagated.
//!
//! # Examples
//!
//! ```rust,no_run
//! use wsession_client::SessionManager;
//!
//! # async fn example(session: &SessionManager) {
//! session
//!     .on_message(|msg| async move {
//!         println!("received {}: {:?}", msg.kind, msg.payload);
//!     })
//!     .await;
//! # }
//! ```

use crate::event::SessionEvent;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use wsession_core::Message;

/// Type for inbound message handler functions
pub type MessageFn =
    Arc<dyn Fn(Message) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Type for session event listener functions
pub type EventFn =
    Arc<dyn Fn(SessionEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Registry of message handlers and event listeners
#[derive(Clone, Default)]
pub struct Dispatcher {
    message_handlers: Arc<Mutex<Vec<MessageFn>>>,
    event_listeners: Arc<Mutex<Vec<EventFn>>>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler invoked for every decoded inbound message
    pub async fn on_message<F, Fut>(&self, handler: F)
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: MessageFn = Arc::new(move |msg| Box::pin(handler(msg)));
        self.message_handlers.lock().await.push(handler);
    }

    /// Register a listener for session events
    pub async fn on_event<F, Fut>(&self, listener: F)
    where
        F: Fn(SessionEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener: EventFn = Arc::new(move |event| Box::pin(listener(event)));
        self.event_listeners.lock().await.push(listener);
    }

    /// Invoke all message handlers for one inbound message
    ///
    /// Handlers run sequentially in registration order and each is awaited
    /// before the next, so dispatch order equals arrival order. Each handler
    /// runs in its own task; a panic fails that task only.
    pub async fn dispatch(&self, msg: Message) {
        let handlers: Vec<MessageFn> = self.message_handlers.lock().await.clone();
        for handler in handlers {
            if let Err(e) = tokio::spawn(handler(msg.clone())).await {
                tracing::warn!(kind = %msg.kind, error = %e, "message handler panicked");
            }
        }
    }

    /// Deliver a session event to all listeners
    pub async fn emit(&self, event: SessionEvent) {
        let listeners: Vec<EventFn> = self.event_listeners.lock().await.clone();
        for listener in listeners {
            if let Err(e) = tokio::spawn(listener(event.clone())).await {
                tracing::warn!(error = %e, "event listener panicked");
            }
        }
    }
}
