//! # Defer: lazy construction.
//!
//! [`Defer`] wraps a factory that builds the real sequence. The factory is
//! invoked once **per consumption**, on the cursor's first `advance`, and
//! receives the consumption's cancellation token so slow construction can be
//! interrupted.
//!
//! ## Flow
//! ```text
//! open(ctx) ──► Pending
//! advance() ──► factory(ctx).await
//!                 ├─ Ok(seq) ──► Active(seq.open(child)) ──► forward values
//!                 └─ Err(e)  ──► Done, return Err(e)
//! ```

use std::future::Future;
use std::mem;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::SequenceError;
use crate::guard;
use crate::sequence::{BoxCursor, Cursor, Sequence, SequenceRef};

type Factory<T> =
    Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<SequenceRef<T>, SequenceError>> + Send + Sync>;

/// Sequence whose construction is deferred to each consumption.
///
/// # Example
/// ```
/// use seqflow::{Defer, SequenceError, SequenceExt, from_iter};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let seq = Defer::new(|_ctx: CancellationToken| async {
///     Ok::<_, SequenceError>(from_iter(["fresh"]).shared())
/// });
/// let out = seq.collect(CancellationToken::new()).await.unwrap();
/// assert_eq!(out, vec!["fresh"]);
/// # }
/// ```
pub struct Defer<T> {
    factory: Factory<T>,
    catch_panics: bool,
}

impl<T> Defer<T> {
    /// Creates a deferred sequence from an async, cancellation-aware factory.
    ///
    /// Synchronous factories ignore the token and return a ready future.
    /// A failure returned by the factory is the terminal notification of that
    /// consumption.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SequenceRef<T>, SequenceError>> + Send + 'static,
    {
        Self {
            factory: Arc::new(move |ctx| factory(ctx).boxed()),
            catch_panics: Config::default().catch_panics,
        }
    }

    /// Applies crate configuration (panic capture).
    pub fn with_config(mut self, cfg: &Config) -> Self {
        self.catch_panics = cfg.catch_panics;
        self
    }
}

impl<T> Sequence<T> for Defer<T>
where
    T: Send + 'static,
{
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T> {
        Box::new(DeferCursor {
            state: DeferState::Pending(Arc::clone(&self.factory)),
            catch_panics: self.catch_panics,
            ctx,
        })
    }
}

enum DeferState<T> {
    Pending(Factory<T>),
    Active(BoxCursor<T>),
    Done,
}

struct DeferCursor<T> {
    state: DeferState<T>,
    catch_panics: bool,
    ctx: CancellationToken,
}

#[async_trait]
impl<T> Cursor<T> for DeferCursor<T>
where
    T: Send + 'static,
{
    async fn advance(&mut self) -> Result<Option<T>, SequenceError> {
        if self.ctx.is_cancelled() {
            self.release().await;
            return Ok(None);
        }
        if let DeferState::Pending(factory) = &self.state {
            let factory = Arc::clone(factory);
            let ctx = self.ctx.clone();
            tracing::debug!("defer: invoking factory");
            match guard::call_async(self.catch_panics, move || factory(ctx)).await {
                Ok(seq) => self.state = DeferState::Active(seq.open(self.ctx.child_token())),
                Err(e) => {
                    tracing::debug!(error = %e, "defer: factory failed");
                    self.state = DeferState::Done;
                    return Err(e);
                }
            }
        }
        let DeferState::Active(inner) = &mut self.state else {
            return Ok(None);
        };
        match inner.advance().await {
            Ok(Some(v)) => Ok(Some(v)),
            Ok(None) => {
                self.release().await;
                Ok(None)
            }
            Err(e) => {
                self.release().await;
                Err(e)
            }
        }
    }

    async fn release(&mut self) {
        if let DeferState::Active(mut inner) = mem::replace(&mut self.state, DeferState::Done) {
            inner.release().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::sequence::{SequenceExt, empty, from_iter};
    use crate::testing::Tracked;

    #[tokio::test]
    async fn test_factory_runs_once_per_consumption() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let seq = Defer::new(move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, SequenceError>(from_iter([1, 2]).shared()) }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let ctx = CancellationToken::new();
        assert_eq!(seq.collect(ctx.clone()).await.unwrap(), vec![1, 2]);
        assert_eq!(seq.collect(ctx).await.unwrap(), vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_open_does_not_invoke_factory() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let seq = Defer::new(move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, SequenceError>(from_iter([1]).shared()) }
        });
        let mut cursor = seq.open(CancellationToken::new());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        cursor.release().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_factory_failure_is_terminal() {
        let seq: Defer<i32> =
            Defer::new(|_ctx| async { Err(SequenceError::factory("no backend")) });
        let mut cursor = seq.open(CancellationToken::new());
        assert_eq!(cursor.advance().await, Err(SequenceError::factory("no backend")));
        assert_eq!(cursor.advance().await, Ok(None));
    }

    #[tokio::test]
    async fn test_factory_panic_becomes_failure() {
        let seq = Defer::new(|_ctx| async {
            if true {
                panic!("factory exploded");
            }
            Ok::<SequenceRef<i32>, SequenceError>(empty::<i32>().shared())
        });
        let res = seq.collect(CancellationToken::new()).await;
        assert_eq!(
            res,
            Err(SequenceError::Panicked {
                error: "factory exploded".into()
            })
        );
    }

    #[tokio::test]
    async fn test_factory_sees_cancellation_token() {
        let seq = Defer::new(|ctx: CancellationToken| async move {
            ctx.cancel();
            Ok::<_, SequenceError>(from_iter([1, 2, 3]).shared())
        });
        let ctx = CancellationToken::new();
        let out = seq.collect(ctx.clone()).await.unwrap();
        assert!(out.is_empty());
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_inner_released_on_cancel() {
        let inner = Tracked::new(from_iter([1, 2, 3]));
        let handle = inner.clone();
        let seq = Defer::new(move |_ctx| {
            let seq = handle.seq();
            async move { Ok::<_, SequenceError>(seq) }
        });
        let ctx = CancellationToken::new();
        let mut cursor = seq.open(ctx.clone());
        assert_eq!(cursor.advance().await, Ok(Some(1)));
        ctx.cancel();
        assert_eq!(cursor.advance().await, Ok(None));
        cursor.release().await;
        assert_eq!((inner.opened(), inner.released()), (1, 1));
    }
}
