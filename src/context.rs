//! Cancellable deadline carried by every cache operation.
//!
//! A [`Context`] bundles an optional deadline with a cancellation token.
//! Store backends race their I/O against it; the mock backend only records
//! it as a matchable argument.
//!
//! Contexts compare by identity: a clone is equal to its source, while two
//! independently created contexts never are, even with the same deadline.
//! That is what lets an expectation pin a call to one specific context.

use crate::error::{Error, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct Inner {
    deadline: Option<Instant>,
    token: CancellationToken,
}

/// Cancellation and deadline scope for a cache call.
///
/// # Example
///
/// ```no_run
/// use cache_contract::Context;
/// use std::time::Duration;
///
/// # async fn example() {
/// let ctx = Context::with_timeout(Duration::from_millis(250));
/// let child = ctx.child();
///
/// ctx.cancel();
/// assert!(child.is_cancelled());
/// # }
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Context without deadline that is never cancelled unless asked to.
    pub fn background() -> Self {
        Self::build(None, CancellationToken::new())
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline), CancellationToken::new())
    }

    /// Derive a child: cancelled with its parent, same deadline.
    pub fn child(&self) -> Self {
        Self::build(self.inner.deadline, self.inner.token.child_token())
    }

    /// Derive a child whose deadline is the earlier of the parent's and `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let requested = Instant::now() + timeout;
        let deadline = match self.inner.deadline {
            Some(parent) if parent < requested => parent,
            _ => requested,
        };
        Self::build(Some(deadline), self.inner.token.child_token())
    }

    fn build(deadline: Option<Instant>, token: CancellationToken) -> Self {
        Context {
            inner: Arc::new(Inner { deadline, token }),
        }
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// True once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.inner
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fail fast if the context is already cancelled or expired.
    ///
    /// # Errors
    /// Returns `Error::BackendError` describing why the context is done.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::backend("context canceled"));
        }
        if self.is_expired() {
            return Err(Error::backend("context deadline exceeded"));
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first.
    ///
    /// The future is dropped (and so aborted) when the context wins the race.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the context finished before `fut`.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output> {
        self.check()?;

        let cancelled = self.inner.token.cancelled();
        match self.inner.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = cancelled => Err(Error::backend("context canceled")),
                _ = tokio::time::sleep_until(deadline) => {
                    Err(Error::backend("context deadline exceeded"))
                }
                out = fut => Ok(out),
            },
            None => tokio::select! {
                biased;
                _ = cancelled => Err(Error::backend("context canceled")),
                out = fut => Ok(out),
            },
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_identity_equality() {
        let ctx = Context::background();
        let clone = ctx.clone();
        assert_eq!(ctx, clone);
        assert_ne!(ctx, Context::background());
        assert_ne!(ctx, ctx.child());
    }

    #[test]
    fn test_cancel_propagates_to_children() {
        let parent = Context::background();
        let child = parent.child();
        assert!(!child.is_cancelled());

        parent.cancel();
        assert!(child.is_cancelled());
        assert!(matches!(child.check(), Err(Error::BackendError(_))));
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_with_timeout_keeps_earlier_deadline() {
        let parent = Context::with_timeout(Duration::from_millis(50));
        let child = parent.child_with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.child_with_timeout(Duration::from_millis(10));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test]
    async fn test_run_completes_before_deadline() {
        let ctx = Context::with_timeout(Duration::from_secs(5));
        let out = ctx.run(async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline_exceeded() {
        let ctx = Context::with_timeout(Duration::from_millis(100));
        let out = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert_eq!(
            out,
            Err(Error::BackendError("context deadline exceeded".into()))
        );
        assert!(ctx.is_expired());
    }

    #[tokio::test]
    async fn test_run_on_cancelled_context() {
        let ctx = Context::background();
        ctx.cancel();
        let out = ctx.run(async { "never" }).await;
        assert_eq!(out, Err(Error::BackendError("context canceled".into())));
    }

    #[tokio::test]
    async fn test_run_cancelled_midway() {
        let ctx = Context::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let out = ctx.run(std::future::pending::<()>()).await;
        assert!(matches!(out, Err(Error::BackendError(_))));
    }
}
