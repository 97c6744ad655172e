//! Reconnection backoff math.
//!
//! Deliberately free of clocks and randomness so the delay sequence is
//! testable; jitter is added at the sleep site by the client.

use super::{INITIAL_RETRY_DELAY_MS, MAX_RETRY_DELAY_MS};

const BACKOFF_MULTIPLIER: u64 = 2;

/// Exponential backoff state for the reconnect loop.
///
/// There is no attempt cap: connection loss is never terminal, the delay
/// just stops growing at the ceiling.
#[derive(Debug, Clone, Copy)]
pub struct BackoffState {
    attempts: u32,
    delay_ms: u64,
}

impl Default for BackoffState {
    fn default() -> Self {
        Self {
            attempts: 0,
            delay_ms: INITIAL_RETRY_DELAY_MS,
        }
    }
}

impl BackoffState {
    /// Back to the floor. Called on every successful open.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The base delay to wait before the next attempt.
    ///
    /// Returns the current delay and doubles the stored value up to the
    /// ceiling, so the doubling only affects the attempt after this one.
    pub fn next_delay_and_advance(&mut self) -> u64 {
        let current_delay = self.delay_ms;
        self.attempts += 1;
        if self.delay_ms < MAX_RETRY_DELAY_MS {
            self.delay_ms = (self.delay_ms * BACKOFF_MULTIPLIER).min(MAX_RETRY_DELAY_MS);
        }
        current_delay
    }
}
