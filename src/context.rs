use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::ContextError;

/// Cancellation and deadline scope of a single [`Pool::acquire()`] call.
///
/// A [`Context`] ends either when its [`CancellationToken`] is cancelled or
/// when its deadline (if any) passes. The reason is reported as a
/// [`ContextError`], so callers can tell both apart.
///
/// The same context is handed to [`Manager::create()`], which is expected to
/// observe it while doing slow work.
///
/// Cloning a [`Context`] is cheap and every clone shares the same token.
///
/// [`Manager::create()`]: crate::Manager::create
/// [`Pool::acquire()`]: crate::Pool::acquire
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Creates a new [`Context`] which never ends unless cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`Context`] driven by an existing [`CancellationToken`].
    #[must_use]
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Attaches a deadline. An earlier existing deadline is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        });
        self
    }

    /// Attaches a deadline `timeout` from now. An earlier existing deadline
    /// is kept.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Creates a child [`Context`].
    ///
    /// Cancelling `self` cancels the child, but cancelling the child leaves
    /// `self` untouched. The deadline is inherited.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this [`Context`] and all of its clones and children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Indicates whether this [`Context`] has been cancelled explicitly.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the underlying [`CancellationToken`].
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the deadline of this [`Context`], if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason this [`Context`] has ended, or [`None`] if it is
    /// still live.
    ///
    /// Explicit cancellation takes precedence over an expired deadline.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Waits until this [`Context`] ends and returns the reason.
    ///
    /// Deadlines rely on [`tokio::time`], so a context with a deadline must be
    /// awaited inside a Tokio runtime with the time driver enabled.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => ContextError::Canceled,
                () = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_live() {
        let ctx = Context::new();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = Context::new();
        let clone = ctx.clone();
        clone.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn child_does_not_cancel_parent() {
        let parent = Context::new();
        let child = parent.child();
        child.cancel();
        assert!(parent.err().is_none());
        assert_eq!(child.err(), Some(ContextError::Canceled));

        let other = parent.child();
        parent.cancel();
        assert_eq!(other.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn earliest_deadline_wins() {
        let now = Instant::now();
        let early = now + Duration::from_secs(1);
        let late = now + Duration::from_secs(10);
        let ctx = Context::new().with_deadline(early).with_deadline(late);
        assert_eq!(ctx.deadline(), Some(early));
        let ctx = Context::new().with_deadline(late).with_deadline(early);
        assert_eq!(ctx.deadline(), Some(early));
    }

    #[test]
    fn cancellation_beats_expired_deadline() {
        let ctx = Context::new().with_deadline(Instant::now());
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[tokio::test]
    async fn done_reports_deadline() {
        let ctx = Context::new().with_timeout(Duration::from_millis(10));
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
    }

    #[tokio::test]
    async fn done_reports_cancellation() {
        let token = CancellationToken::new();
        let ctx = Context::with_cancellation(token.clone()).with_timeout(Duration::from_secs(60));
        let _ = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        assert_eq!(ctx.done().await, ContextError::Canceled);
    }
}
