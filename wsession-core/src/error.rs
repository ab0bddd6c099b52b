//! Error types for wsession
//!
//! This module defines the error taxonomy shared by the session manager and
//! the codec:
//!
//! - **Encode / Decode**: local to the codec. A decode failure on a single
//!   inbound frame never closes the connection; the frame is dropped and
//!   reported through the session's dead-letter event.
//! - **Transport / Timeout**: failures at the socket layer. These drive the
//!   session state machine into its retry loop and are always recovered
//!   locally (up to policy exhaustion).
//! - **Exhausted**: the retry policy gave up. Terminal for the current run;
//!   a new `connect()` starts over.
//! - **Closed**: an operation raced an explicit `close()`.
//!
//! Queue overflow is deliberately *not* an error: dropping the oldest queued
//! message is non-fatal policy and is reported as an observability event
//! instead.
//!
//! # Examples
//!
//! ```rust
//! use wsession_core::Error;
//!
//! let err = Error::Decode("missing `kind` field".into());
//! assert!(err.to_string().contains("missing"));
//! ```

use thiserror::Error;

/// Result type for wsession operations
///
/// Convenience alias used throughout the wsession crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for wsession operations
///
/// Covers codec failures, transport failures, and session lifecycle
/// outcomes. Transport-level variants are recovered internally by the
/// session's retry loop; callers only observe them through events unless
/// they hold onto a transport handle directly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A message could not be serialized to a JSON text frame
    #[error("encode error: {0}")]
    Encode(String),

    /// An inbound text frame could not be parsed into a message
    ///
    /// Malformed JSON, a non-object frame, or a missing/empty `kind` field.
    #[error("decode error: {0}")]
    Decode(String),

    /// Failure at the underlying socket layer
    ///
    /// Connection refused, handshake failure, mid-stream I/O error, or a
    /// failed transmit.
    #[error("transport error: {0}")]
    Transport(String),

    /// The connect attempt did not complete within the configured timeout
    ///
    /// Behaves identically to a transport error as far as the state machine
    /// is concerned.
    #[error("connect timed out")]
    Timeout,

    /// The retry policy ran out of attempts
    #[error("reconnect attempts exhausted")]
    Exhausted,

    /// The session was explicitly closed
    #[error("session closed")]
    Closed,
}
