//! Core types for wsession
//!
//! This crate holds the pieces shared between the session manager and any
//! other consumer of the wire format:
//!
//! - **Message**: the tagged application message (`kind` + JSON payload)
//! - **codec**: pure encode/decode between messages and JSON text frames
//! - **Error / Result**: the error taxonomy for the whole workspace
//!
//! The session manager itself lives in `wsession-client`.

pub mod codec;
pub mod error;
pub mod message;

pub use error::{Error, Result};
pub use message::Message;
