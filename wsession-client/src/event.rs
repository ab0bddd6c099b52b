//! Session observability events
//!
//! Nothing the session recovers from on its own is surfaced as an error to
//! the caller. Instead, the caller registers an event listener and receives
//! these asynchronously:
//!
//! - **Overflow**: the outbound queue was full and dropped its oldest
//!   message (non-fatal, drop-oldest policy)
//! - **DeadLetter**: an inbound frame failed to decode; the frame was
//!   dropped, the connection stays up
//! - **Exhausted**: the backoff policy gave up; emitted exactly once per
//!   run, after which the session is Disconnected until a new `connect()`
//! - **StateChanged**: every state machine transition, for logging or UI

use crate::state::SessionState;
use wsession_core::{Error, Message};

/// Event delivered to `on_event` listeners
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The outbound queue evicted its oldest message to make room
    Overflow {
        /// The message that was dropped
        dropped: Message,
    },
    /// A frame could not be decoded (inbound) or encoded (outbound) and
    /// was dropped
    DeadLetter {
        /// Raw inbound frame text, or a debug rendering of the outbound
        /// message that failed to encode
        frame: String,
        /// The codec error
        error: Error,
    },
    /// Retry attempts ran out; the session is Disconnected
    Exhausted,
    /// The state machine transitioned
    StateChanged(SessionState),
}
