use std::time::{Duration, Instant};

use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub text: String,
    pub level: NotificationLevel,
    pub created_at: OffsetDateTime,
    expires_at: Instant,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Stack of transient messages, oldest first. Each entry expires on its own
/// deadline; expiry is driven by [`NotificationCenter::expire`] from the UI tick.
#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    next_id: u64,
    items: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 1,
            items: Vec::new(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, text: S, level: NotificationLevel) -> u64 {
        self.push_at(text, level, Instant::now())
    }

    pub fn push_at<S: Into<String>>(
        &mut self,
        text: S,
        level: NotificationLevel,
        now: Instant,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let text = text.into();
        tracing::debug!(id, ?level, %text, "notification shown");
        self.items.push(Notification {
            id,
            text,
            level,
            created_at: OffsetDateTime::now_utc(),
            expires_at: now + self.ttl,
        });
        id
    }

    /// Drops every notification whose deadline has passed; returns how many went away.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.expires_at > now);
        let removed = before - self.items.len();
        if removed > 0 {
            tracing::debug!(removed, "notifications expired");
        }
        removed
    }

    pub fn dismiss_oldest(&mut self) -> Option<Notification> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
