//! Transient user-facing messages with auto-dismiss.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

impl Level {
    pub fn lifetime(self) -> Duration {
        match self {
            Level::Info | Level::Success => Duration::from_secs(4),
            Level::Error => Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
    next_id: u64,
}

impl Notifications {
    pub fn push_at(&mut self, level: Level, message: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Notification {
            id,
            level,
            message: message.into(),
            expires_at: now + level.lifetime(),
        });
        id
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push_at(Level::Info, message, Instant::now())
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push_at(Level::Success, message, Instant::now())
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push_at(Level::Error, message, Instant::now())
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|n| n.id != id);
    }

    /// Drops expired notifications; returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items.retain(|n| n.expires_at > now);
        before - self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Earliest pending expiry, for scheduling the next repaint.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.items.iter().map(|n| n.expires_at).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_outlive_successes() {
        let t0 = Instant::now();
        let mut n = Notifications::default();
        n.push_at(Level::Success, "saved", t0);
        let err = n.push_at(Level::Error, "failed", t0);

        assert_eq!(n.prune(t0 + Duration::from_secs(5)), 1);
        assert_eq!(n.iter().map(|n| n.id).collect::<Vec<_>>(), vec![err]);
        assert_eq!(n.prune(t0 + Duration::from_secs(9)), 1);
        assert!(n.is_empty());
    }
}
