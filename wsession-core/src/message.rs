//! Application message type
//!
//! A `Message` is the unit of exchange between the caller and the wire: a
//! tagged value with a `kind` discriminator and a JSON object payload. It is
//! immutable once constructed: handlers receive it by value and the session
//! never mutates a message between enqueue and transmit.
//!
//! # Wire shape
//!
//! Messages serialize to flat JSON objects with the payload fields inlined
//! next to `kind`:
//!
//! ```json
//! {"kind":"chat","subsystem":"engine","message":"temperature warning"}
//! ```
//!
//! # Examples
//!
//! ```rust
//! use wsession_core::Message;
//! use serde_json::json;
//!
//! let msg = Message::new("chat")
//!     .with("subsystem", json!("engine"))
//!     .with("message", json!("temperature warning light stays on"));
//!
//! assert_eq!(msg.kind, "chat");
//! assert_eq!(msg.payload["subsystem"], json!("engine"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tagged application message
///
/// `kind` names the message type; `payload` carries its fields. The payload
/// is an arbitrary JSON object; typed views are the caller's concern.
///
/// Because the payload is flattened next to `kind` on the wire, the `kind`
/// key is reserved: the constructors drop it from payloads, and `encode`
/// rejects a payload that smuggles one in through the public field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message type discriminator, required and non-empty on the wire
    pub kind: String,
    /// Payload fields, flattened next to `kind` in the JSON frame
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Message {
    /// Create a message with an empty payload
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Map::new(),
        }
    }

    /// Create a message from an existing payload object
    ///
    /// A `kind` entry in the payload is dropped; the discriminator parameter
    /// is authoritative.
    pub fn with_payload(kind: impl Into<String>, mut payload: Map<String, Value>) -> Self {
        payload.remove("kind");
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Add a payload field (builder style)
    ///
    /// The reserved `kind` key is ignored; use `Message::new` to set the
    /// discriminator.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key != "kind" {
            self.payload.insert(key, value);
        }
        self
    }
}
