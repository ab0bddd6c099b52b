//! Session state machine
//!
//! Tracks the connection lifecycle and owns the retry bookkeeping.
//!
//! # States
//!
//! - **Disconnected**: initial state; also terminal after an explicit close
//!   or after retry exhaustion. Re-enterable via a new `connect()`.
//! - **Connecting**: an attempt is in flight
//! - **Open**: connected and transmitting
//! - **Closing**: explicit close in progress
//! - **Failed**: an attempt or open connection failed; feeds the backoff loop
//!
//! # Transitions
//!
//! ```text
//! Disconnected --connect()--> Connecting --open--> Open --close()--> Closing --> Disconnected
//!                                  |                 |
//!                               error/timeout    error/close
//!                                  v                 v
//!                               Failed{n} --delay--> Connecting     (attempts remain)
//!                               Failed{n} --------> Disconnected    (exhausted)
//! ```
//!
//! # Epochs
//!
//! Every explicit `connect()` or `close()` bumps a generation counter. The
//! run loop samples the counter when it starts and re-checks it after every
//! await; a stale loop (superseded by a newer connect or a close) must not
//! transition the state machine. The Open transition itself goes through
//! [`StateTracker::mark_open_if_current`], which compares the epoch under
//! the state write lock, so a cancelled attempt can never deliver a late
//! Open.

use crate::backoff::BackoffPolicy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Connection lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected; initial and terminal state
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Connected and operational
    Open,
    /// Explicit close in progress
    Closing,
    /// Attempt failed; waiting on the backoff timer
    Failed {
        /// 0-indexed count of consecutive failed attempts
        attempt: u32,
    },
}

/// Owns the session state, the backoff policy, and the epoch counter
pub struct StateTracker {
    state: RwLock<SessionState>,
    policy: Mutex<Box<dyn BackoffPolicy>>,
    epoch: AtomicU64,
}

impl StateTracker {
    /// Create a tracker in the Disconnected state
    pub fn new(policy: Box<dyn BackoffPolicy>) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(SessionState::Disconnected),
            policy: Mutex::new(policy),
            epoch: AtomicU64::new(0),
        })
    }

    /// Current state
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Set the state unconditionally
    pub async fn set_state(&self, new_state: SessionState) {
        *self.state.write().await = new_state;
    }

    /// Current epoch
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Invalidate any in-flight attempt or pending retry timer
    ///
    /// Returns the new epoch. Called on every explicit `connect()` and
    /// `close()`.
    pub fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `epoch` is still the live generation
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch() == epoch
    }

    /// Transition to Open and reset the backoff policy, unless superseded
    ///
    /// The epoch comparison and the state write happen under the same state
    /// write lock. A `close()` or newer `connect()` bumps the epoch before
    /// reading the state, so either the bump lands first and this refuses,
    /// or the Open is written first and the closer observes it and tears it
    /// down. A stale run loop can never leave a phantom Open behind.
    ///
    /// Returns false when `epoch` is no longer the live generation.
    pub async fn mark_open_if_current(&self, epoch: u64) -> bool {
        let mut state = self.state.write().await;
        if self.epoch() != epoch {
            return false;
        }
        *state = SessionState::Open;
        self.policy.lock().await.reset();
        true
    }

    /// Reset the backoff policy without changing state
    ///
    /// Called by an explicit `connect()` so a fresh run starts from a clean
    /// policy even after an exhausted one.
    pub async fn reset_policy(&self) {
        self.policy.lock().await.reset();
    }

    /// Record a failed attempt and ask the policy for the next delay
    ///
    /// Transitions to `Failed{attempt}` and returns the delay to sleep
    /// before retrying. Returns `None` when the policy is exhausted, in
    /// which case the state moves to Disconnected (terminal for this run).
    pub async fn next_retry_delay(&self) -> Option<Duration> {
        let attempt = match self.state().await {
            SessionState::Failed { attempt } => attempt,
            _ => 0,
        };

        let delay = self.policy.lock().await.next_delay(attempt);

        if delay.is_some() {
            self.set_state(SessionState::Failed {
                attempt: attempt + 1,
            })
            .await;
        } else {
            self.set_state(SessionState::Disconnected).await;
        }

        delay
    }
}
