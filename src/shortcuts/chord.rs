use std::time::{Duration, Instant};

use tracing::trace;

pub const DEFAULT_CHORD_TIMEOUT: Duration = Duration::from_millis(400);

const MAX_KEYS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    /// `gg`
    ScrollTop,
    /// `ZZ`
    Submit,
}

/// The last two printable keys pressed, forgotten once no key has arrived
/// for the timeout.
#[derive(Debug, Clone)]
pub struct ChordBuffer {
    keys: String,
    expires_at: Option<Instant>,
    timeout: Duration,
}

impl Default for ChordBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CHORD_TIMEOUT)
    }
}

impl ChordBuffer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            keys: String::new(),
            expires_at: None,
            timeout,
        }
    }

    /// Record a key press and restart the expiry timer.
    pub fn push(&mut self, key: char, now: Instant) {
        self.expire(now);
        self.keys.push(key);
        let excess = self.keys.chars().count().saturating_sub(MAX_KEYS);
        if excess > 0 {
            self.keys = self.keys.chars().skip(excess).collect();
        }
        self.expires_at = Some(now + self.timeout);
        trace!(buffer = %self.keys, "chord buffer");
    }

    /// Clear the buffer if its timer has fired by `now`.
    pub fn expire(&mut self, now: Instant) {
        if self.expires_at.is_some_and(|at| now >= at) {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.expires_at = None;
    }

    pub fn matched(&self) -> Option<Chord> {
        match self.keys.as_str() {
            "gg" => Some(Chord::ScrollTop),
            "ZZ" => Some(Chord::Submit),
            _ => None,
        }
    }

    pub fn keys(&self) -> &str {
        &self.keys
    }
}
