//! Transient status messages.
//!
//! Each notice carries its own removal deadline. The owner sweeps expired
//! notices with [`NotificationManager::expire`], passing the current time in,
//! so removal never depends on a wall-clock timer firing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Style class for the notice; each severity maps to a distinct one.
    pub fn class(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct NotificationManager {
    // Front is the most recent notice.
    notices: VecDeque<Notice>,
    ttl: Duration,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

impl NotificationManager {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

    pub fn new(ttl: Duration) -> Self {
        Self {
            notices: VecDeque::new(),
            ttl,
        }
    }

    /// Show a message on top of the stack; it is removed `ttl` after `now`.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::debug!(class = severity.class(), %message, "notice");
        self.notices.push_front(Notice {
            severity,
            message,
            expires_at: now + self.ttl,
        });
    }

    /// Remove every notice whose deadline has passed. Returns how many went;
    /// a deadline whose notice is already gone removes nothing.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.notices.len();
        self.notices.retain(|n| n.expires_at > now);
        before - self.notices.len()
    }

    /// Notices, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
