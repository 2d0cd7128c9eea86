//! Transient notifications raised by controller operations.

use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_DURATION_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub duration: Duration,
}

impl Toast {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + self.duration
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
    duration: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MS)
    }
}

impl ToastQueue {
    pub fn new(duration_ms: u64) -> Self {
        let duration_ms = if duration_ms == 0 {
            DEFAULT_DURATION_MS
        } else {
            duration_ms
        };
        Self {
            toasts: Vec::new(),
            next_id: 1,
            duration: Duration::milliseconds(i64::try_from(duration_ms).unwrap_or(i64::MAX / 2)),
        }
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Success, message.into(), Utc::now())
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, message.into(), Utc::now())
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Info, message.into(), Utc::now())
    }

    pub fn push(&mut self, kind: ToastKind, message: String, now: DateTime<Utc>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            kind,
            message,
            created_at: now,
            duration: self.duration,
        });
        id
    }

    /// Returns false when no toast carries `id`.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        self.toasts.len() != before
    }

    /// Drops expired toasts and returns how many were dropped.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.toasts.len();
        self.toasts.retain(|toast| !toast.is_expired(now));
        before - self.toasts.len()
    }

    /// Removes and returns every queued toast, oldest first.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    pub fn active(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn last(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_their_duration() {
        let start = Utc::now();
        let mut queue = ToastQueue::new(3000);
        queue.push(ToastKind::Success, "saved".to_string(), start);
        queue.push(
            ToastKind::Info,
            "later".to_string(),
            start + Duration::milliseconds(2000),
        );

        assert_eq!(queue.expire(start + Duration::milliseconds(2999)), 0);
        assert_eq!(queue.expire(start + Duration::milliseconds(3000)), 1);
        assert_eq!(queue.active()[0].message, "later");
        assert_eq!(queue.expire(start + Duration::milliseconds(5000)), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn dismiss_by_id() {
        let mut queue = ToastQueue::default();
        let first = queue.error("boom");
        let second = queue.info("fyi");
        assert_ne!(first, second);
        assert!(queue.dismiss(first));
        assert!(!queue.dismiss(first));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.last().map(|t| t.kind), Some(ToastKind::Info));
    }

    #[test]
    fn zero_duration_falls_back_to_default() {
        let queue = ToastQueue::new(0);
        assert_eq!(queue.duration, Duration::milliseconds(3000));
    }
}
