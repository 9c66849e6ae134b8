//! View state with request-generation tokens.
//!
//! Every screen re-fetches its data after each workflow completes. A fetch can
//! finish after a newer one was started, or after the view was closed; its
//! result must then be dropped instead of overwriting fresher state.

use crate::errors::Result;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Ticket identifying one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Issues increasing tickets; only the latest one is current.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    generation: AtomicU64,
}

impl RefreshGuard {
    /// Creates a guard with no fetch issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
        }
    }

    /// Starts a fetch, superseding all earlier tickets.
    pub fn begin(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// True if no fetch was started (and no invalidation happened) since `ticket`.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Supersedes every outstanding ticket, e.g. when the view closes.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// Latest fetched data for one view.
#[derive(Debug)]
pub struct View<T> {
    data: Arc<RwLock<Option<T>>>,
    guard: Arc<RefreshGuard>,
}

impl<T> Clone for View<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<T> Default for View<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> View<T> {
    /// An empty view.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(None)),
            guard: Arc::new(RefreshGuard::new()),
        }
    }

    /// Takes a ticket for a fetch that will be applied with [`View::apply`].
    pub fn begin(&self) -> Ticket {
        self.guard.begin()
    }

    /// Stores `value` if `ticket` is still current. Returns whether it was stored.
    pub async fn apply(&self, ticket: Ticket, value: T) -> bool {
        let mut writer = self.data.write().await;
        if !self.guard.is_current(ticket) {
            debug!("Dropping stale view data from {:?}", ticket);
            return false;
        }
        *writer = Some(value);
        trace!("Applied view data from {:?}", ticket);
        true
    }

    /// Runs `fetch` and stores its result unless a newer fetch or a close happened meanwhile.
    ///
    /// Returns whether the result was stored. A failed fetch leaves the view untouched.
    pub async fn refresh<F>(&self, fetch: F) -> Result<bool>
    where
        F: Future<Output = Result<T>>,
    {
        let ticket = self.begin();
        let value = fetch.await?;
        Ok(self.apply(ticket, value).await)
    }

    /// Clears the data and drops the results of any fetch still in flight.
    pub async fn close(&self) {
        self.guard.invalidate();
        *self.data.write().await = None;
    }

    /// True once data has been stored.
    pub async fn is_loaded(&self) -> bool {
        self.data.read().await.is_some()
    }
}

impl<T: Clone> View<T> {
    /// Copy of the current data.
    pub async fn snapshot(&self) -> Option<T> {
        self.data.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::student::get_all_students;
    use crate::errors::Error;
    use crate::test_utils::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let guard = RefreshGuard::new();
        let first = guard.begin();
        assert!(guard.is_current(first));

        let second = guard.begin();
        assert!(second > first);
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));

        guard.invalidate();
        assert!(!guard.is_current(second));
    }

    #[tokio::test]
    async fn test_late_result_does_not_overwrite_newer_one() {
        let view: View<&str> = View::new();
        let slow = view.begin();
        let fast = view.begin();

        assert!(view.apply(fast, "fresh").await);
        assert!(!view.apply(slow, "stale").await);
        assert_eq!(view.snapshot().await, Some("fresh"));
    }

    #[tokio::test]
    async fn test_result_after_close_is_dropped() {
        let view: View<u32> = View::new();
        let ticket = view.begin();
        view.close().await;

        assert!(!view.apply(ticket, 7).await);
        assert!(!view.is_loaded().await);
    }

    #[tokio::test]
    async fn test_refresh_from_store() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        let view = View::new();

        assert!(view.refresh(get_all_students(&db)).await?);
        let students = view.snapshot().await.unwrap_or_default();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].id, student.id);

        let failed = view
            .refresh(async { Err(Error::validation("fetch failed")) })
            .await;
        assert!(failed.is_err());
        assert_eq!(view.snapshot().await.map(|s| s.len()), Some(1));
        Ok(())
    }
}
