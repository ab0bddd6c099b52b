//! Outbound message queue
//!
//! Messages sent while the session is disconnected or mid-handshake land
//! here. The queue is strictly FIFO: once the connection reaches Open it is
//! drained front-to-back, and a transmit failure puts the failed message back
//! at the front so nothing is lost or reordered (at-least-once intent).
//!
//! # Capacity
//!
//! Unbounded by default. With a capacity configured, pushing onto a full
//! queue evicts the *oldest* message, which is handed back to the caller so
//! it can be reported as an overflow event. Eviction is non-fatal.

use std::collections::VecDeque;
use wsession_core::Message;

/// FIFO buffer for messages awaiting an open connection
pub struct OutboundQueue {
    items: VecDeque<Message>,
    capacity: Option<usize>,
}

impl OutboundQueue {
    /// Create an unbounded queue
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            capacity: None,
        }
    }

    /// Create a queue that holds at most `capacity` messages
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    /// Append a message, evicting and returning the oldest one if full
    pub fn push(&mut self, msg: Message) -> Option<Message> {
        let evicted = match self.capacity {
            Some(cap) if self.items.len() >= cap => self.items.pop_front(),
            _ => None,
        };
        self.items.push_back(msg);
        evicted
    }

    /// Take the next message to transmit
    pub fn pop_front(&mut self) -> Option<Message> {
        self.items.pop_front()
    }

    /// Put a message back at the front after a failed transmit
    ///
    /// Keeps FIFO order intact: the message will be the first one retried.
    pub fn requeue_front(&mut self, msg: Message) {
        self.items.push_front(msg);
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new()
    }
}
