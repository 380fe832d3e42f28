//! Transient surface for user-visible failure messages.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How long a message stays visible before it expires on its own.
pub const DEFAULT_ERROR_EXPIRY: Duration = Duration::from_secs(15);

/// Ordered, self-expiring queue of human-readable failure messages.
///
/// Entries are keyed by identity, not content: pushing the same text twice
/// yields two entries that expire independently. Cheap to clone; clones share
/// the queue. Rendering concern only - no retry or escalation logic lives
/// here.
#[derive(Clone)]
pub struct ErrorSurface {
    inner: Arc<Inner>,
}

struct Inner {
    entries: Mutex<Vec<(u64, String)>>,
    next_id: AtomicU64,
    expiry: Duration,
}

impl ErrorSurface {
    /// Creates a surface with the default expiry window.
    pub fn new() -> Self {
        Self::with_expiry(DEFAULT_ERROR_EXPIRY)
    }

    /// Creates a surface with a custom expiry window.
    pub fn with_expiry(expiry: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                expiry,
            }),
        }
    }

    /// Appends a message and schedules its removal after the expiry window.
    ///
    /// Must be called from within a tokio runtime; the expiry timer is a
    /// spawned task. Returns the entry id for tests and manual dismissal.
    pub fn push(&self, message: impl Into<String>) -> u64 {
        let message = message.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(id, %message, "surfacing error");
        self.inner.entries.lock().push((id, message));

        let surface = self.clone();
        let expiry = self.inner.expiry;
        tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            surface.dismiss(id);
        });
        id
    }

    /// Removes an entry by identity. Missing ids are ignored.
    pub fn dismiss(&self, id: u64) {
        self.inner.entries.lock().retain(|(entry_id, _)| *entry_id != id);
    }

    /// Returns the active messages in push order.
    pub fn messages(&self) -> Vec<String> {
        self.inner
            .entries
            .lock()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Returns true when no messages are active.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }
}

impl Default for ErrorSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_preserves_order() {
        let surface = ErrorSurface::new();
        surface.push("first");
        surface.push("second");
        assert_eq!(surface.messages(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn duplicate_messages_have_independent_identity() {
        let surface = ErrorSurface::new();
        let first = surface.push("same text");
        let _second = surface.push("same text");

        surface.dismiss(first);
        assert_eq!(surface.messages(), vec!["same text"]);
    }

    #[tokio::test(start_paused = true)]
    async fn messages_expire_after_window() {
        let surface = ErrorSurface::with_expiry(Duration::from_secs(15));
        surface.push("goes away");
        assert_eq!(surface.messages().len(), 1);

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert!(surface.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn staggered_pushes_expire_independently() {
        let surface = ErrorSurface::with_expiry(Duration::from_secs(15));
        surface.push("older");
        tokio::time::sleep(Duration::from_secs(10)).await;
        surface.push("newer");

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(surface.messages(), vec!["newer"]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(surface.is_empty());
    }
}
