//! Codec between messages and JSON text frames
//!
//! The wire format is one UTF-8 JSON object per text frame. Encoding and
//! decoding are pure functions with no side effects; all failures surface as
//! `Error::Encode` / `Error::Decode` and never touch connection state.
//!
//! # Validation
//!
//! `decode()` goes through `serde_json::Value` first so that structural
//! problems can be reported precisely:
//! - non-JSON input → decode error
//! - a frame that is not an object (array, string, number) → decode error
//! - a missing or empty `kind` field → decode error
//!
//! A frame that fails to decode is the *frame's* problem, never the
//! session's: callers drop the frame and report it, nothing else.
//!
//! # Examples
//!
//! ```rust
//! use wsession_core::{codec, Message};
//! use serde_json::json;
//!
//! let msg = Message::new("chat").with("message", json!("hi"));
//! let text = codec::encode(&msg).unwrap();
//! assert_eq!(codec::decode(&text).unwrap(), msg);
//! ```

use crate::error::{Error, Result};
use crate::message::Message;

/// Encode a message to a JSON text frame
///
/// # Errors
///
/// Returns `Error::Encode` if the payload contains the reserved `kind` key
/// (flattening it would emit a duplicate key and break round-tripping) or if
/// serialization fails.
pub fn encode(msg: &Message) -> Result<String> {
    if msg.payload.contains_key("kind") {
        return Err(Error::Encode("payload contains reserved `kind` key".into()));
    }
    serde_json::to_string(msg).map_err(|e| Error::Encode(e.to_string()))
}

/// Decode a JSON text frame into a message
///
/// # Errors
///
/// Returns `Error::Decode` if the text is not valid JSON, is not an object,
/// or lacks a non-empty `kind` field.
pub fn decode(data: &str) -> Result<Message> {
    // Parse into a generic value first so structural errors are distinguishable
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|e| Error::Decode(e.to_string()))?;

    if !value.is_object() {
        return Err(Error::Decode("frame is not a JSON object".into()));
    }

    let msg: Message = serde_json::from_value(value)
        .map_err(|_| Error::Decode("missing or invalid `kind` field".into()))?;

    if msg.kind.is_empty() {
        return Err(Error::Decode("`kind` field is empty".into()));
    }

    Ok(msg)
}
