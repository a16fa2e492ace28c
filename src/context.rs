//! Operation Context
//!
//! A [`Context`] carries an optional deadline and an optional cancellation
//! token. The cache applies it to remote-store calls only; local-tier work
//! never suspends and ignores it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{CacheError, Result};

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

// == Cancel Token ==
/// Cloneable handle that cancels every context built from it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token cancelled and wakes every pending waiter.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            // Registered before the flag check so a concurrent cancel is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

// == Context ==
/// Deadline and cancellation scope for one cache operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl Context {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context expiring `timeout` from now.
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::background().deadline(deadline),
            None => Self::background(),
        }
    }

    /// A context expiring at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline(deadline)
    }

    /// A context cancelled through `token`.
    pub fn with_cancel(token: CancelToken) -> Self {
        Self::background().cancel_token(token)
    }

    /// Tightens the deadline; an earlier existing deadline wins.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Attaches a cancellation token, replacing any previous one.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn get_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the error a finished context reports, or `None` while live.
    pub fn err(&self) -> Option<CacheError> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(CacheError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CacheError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Drives `fut` until it completes or the context finishes.
    ///
    /// A context that is already done fails without polling `fut`. When the
    /// context finishes first, `fut` is dropped and [`CacheError::Cancelled`]
    /// or [`CacheError::DeadlineExceeded`] is returned.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(CacheError::Cancelled),
            _ = expired => Err(CacheError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = Context::background();
        let result = ctx.run(async { Ok::<_, CacheError>(42) }).await;
        assert_eq!(result, Ok(42));
        assert!(!ctx.is_done());
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_future() {
        let token = CancelToken::new();
        token.cancel();
        let ctx = Context::with_cancel(token);

        let polled = AtomicBool::new(false);
        let result = ctx
            .run(async {
                polled.store(true, Ordering::SeqCst);
                Ok::<_, CacheError>(())
            })
            .await;

        assert_eq!(result, Err(CacheError::Cancelled));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_slow_future() {
        let ctx = Context::with_timeout(Duration::from_millis(100));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, CacheError>(())
            })
            .await;

        assert_eq!(result, Err(CacheError::DeadlineExceeded));
        assert_eq!(ctx.err(), Some(CacheError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_running() {
        let token = CancelToken::new();
        let ctx = Context::with_cancel(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, CacheError>(())
            })
            .await;

        canceller.await.unwrap();
        assert_eq!(result, Err(CacheError::Cancelled));
    }

    #[test]
    fn test_deadline_keeps_earliest() {
        let now = Instant::now();
        let ctx = Context::with_deadline(now + Duration::from_secs(1))
            .deadline(now + Duration::from_secs(5));
        assert_eq!(ctx.get_deadline(), Some(now + Duration::from_secs(1)));
    }
    #[tokio::test]
    async fn test_unrepresentable_timeout_has_no_deadline() {
        let ctx = Context::with_timeout(Duration::MAX);

        assert_eq!(ctx.get_deadline(), None);
        assert_eq!(ctx.run(async { Ok(7) }).await, Ok(7));
    }
}
