//! # Expand: breadth-first recursive unfolding.
//!
//! [`Expand`] keeps a FIFO queue of pending sequences, seeded with the source.
//! It drains the front sequence completely; for every value it first applies
//! the selector (enqueueing the returned sequence) and then yields the value.
//! When the queue is empty the consumption completes.
//!
//! ## State machine
//! ```text
//!            ┌──────────── inner exhausted ────────────┐
//!            ▼                                          │
//! Idle ──pop_front()──► Draining(inner) ──value──► selector(value) ──► push_back, yield value
//!   │                        │
//!   └─ queue empty ─► Done ◄─┴─ inner failed / selector failed / cancelled
//! ```
//!
//! ## Rules
//! - Values come out in breadth-first order of the expansion tree.
//! - Traversal is iterative over an explicit queue: stack depth is constant
//!   regardless of expansion depth.
//! - The queue is unbounded. A selector that enqueues faster than consumption
//!   drains grows memory without limit; [`Config::expand_queue_warn`] only logs.
//! - Any failure discards the queue and releases the active inner cursor.

use std::collections::VecDeque;
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

type Selector<T> = Arc<
    dyn Fn(T, CancellationToken) -> BoxFuture<'static, Result<SequenceRef<T>, SequenceError>>
        + Send
        + Sync,
>;

/// Breadth-first expansion of a sequence through a selector.
///
/// # Example
/// ```
/// use seqflow::{Expand, SequenceError, SequenceExt, empty, from_iter};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// // Each node n has children 2n and 2n+1, up to 7.
/// let tree = Expand::new(from_iter([1u32]).shared(), |n: u32, _ctx| async move {
///     Ok::<_, SequenceError>(if n < 4 {
///         from_iter([2 * n, 2 * n + 1]).shared()
///     } else {
///         empty().shared()
///     })
/// });
/// let out = tree.collect(CancellationToken::new()).await.unwrap();
/// assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7]);
/// # }
/// ```
pub struct Expand<T> {
    source: SequenceRef<T>,
    selector: Selector<T>,
    config: Config,
}

impl<T> Expand<T> {
    /// Creates a breadth-first expansion of `source`.
    ///
    /// `selector` receives each produced value and the consumption's
    /// cancellation token and returns the sequence of that value's children.
    /// Synchronous selectors ignore the token and return a ready future.
    pub fn new<F, Fut>(source: SequenceRef<T>, selector: F) -> Self
    where
        F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SequenceRef<T>, SequenceError>> + Send + 'static,
    {
        Self {
            source,
            selector: Arc::new(move |value, ctx| selector(value, ctx).boxed()),
            config: Config::default(),
        }
    }

    /// Applies crate configuration (queue warning threshold, panic capture).
    pub fn with_config(mut self, cfg: &Config) -> Self {
        self.config = cfg.clone();
        self
    }
}

impl<T> Sequence<T> for Expand<T>
where
    T: Clone + Send + 'static,
{
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T> {
        let mut queue = VecDeque::new();
        queue.push_back(Arc::clone(&self.source));
        Box::new(ExpandCursor {
            queue,
            state: ExpandState::Idle,
            selector: Arc::clone(&self.selector),
            catch_panics: self.config.catch_panics,
            warn_limit: self.config.expand_queue_warn_limit(),
            warned: false,
            ctx,
        })
    }
}

enum ExpandState<T> {
    Idle,
    Draining(BoxCursor<T>),
    Done,
}

struct ExpandCursor<T> {
    queue: VecDeque<SequenceRef<T>>,
    state: ExpandState<T>,
    selector: Selector<T>,
    catch_panics: bool,
    warn_limit: Option<usize>,
    warned: bool,
    ctx: CancellationToken,
}

impl<T> ExpandCursor<T> {
    fn enqueue(&mut self, seq: SequenceRef<T>) {
        self.queue.push_back(seq);
        if let Some(limit) = self.warn_limit {
            if !self.warned && self.queue.len() > limit {
                self.warned = true;
                tracing::warn!(
                    pending = self.queue.len(),
                    limit,
                    "expand: queue exceeds warning threshold; memory is unbounded"
                );
            }
        }
    }
}

#[async_trait]
impl<T> Cursor<T> for ExpandCursor<T>
where
    T: Clone + Send + 'static,
{
    async fn advance(&mut self) -> Result<Option<T>, SequenceError> {
        loop {
            if self.ctx.is_cancelled() {
                self.release().await;
                return Ok(None);
            }
            match &mut self.state {
                ExpandState::Done => return Ok(None),
                ExpandState::Idle => match self.queue.pop_front() {
                    Some(seq) => {
                        tracing::debug!(pending = self.queue.len(), "expand: draining next sequence");
                        self.state = ExpandState::Draining(seq.open(self.ctx.child_token()));
                    }
                    None => {
                        self.state = ExpandState::Done;
                        return Ok(None);
                    }
                },
                ExpandState::Draining(inner) => match inner.advance().await {
                    Ok(Some(value)) => {
                        let selector = Arc::clone(&self.selector);
                        let arg = value.clone();
                        let ctx = self.ctx.clone();
                        match guard::call_async(self.catch_panics, move || selector(arg, ctx)).await {
                            Ok(children) => {
                                self.enqueue(children);
                                return Ok(Some(value));
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "expand: selector failed");
                                self.release().await;
                                return Err(e);
                            }
                        }
                    }
                    Ok(None) => {
                        inner.release().await;
                        self.state = ExpandState::Idle;
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "expand: inner sequence failed");
                        self.release().await;
                        return Err(e);
                    }
                },
            }
        }
    }

    async fn release(&mut self) {
        self.queue.clear();
        if let ExpandState::Draining(mut inner) = mem::replace(&mut self.state, ExpandState::Done) {
            inner.release().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::sequence::{SequenceExt, empty, fail, from_iter};
    use crate::testing::{Tracked, drain_interleaved};

    fn chain_up_to(limit: i32) -> impl Fn(i32, CancellationToken) -> futures::future::Ready<Result<SequenceRef<i32>, SequenceError>>
    + Send
    + Sync
    + 'static {
        move |x, _ctx| {
            futures::future::ready(Ok(if x < limit {
                from_iter([x + 1]).shared()
            } else {
                empty().shared()
            }))
        }
    }

    #[tokio::test]
    async fn test_linear_chain() {
        let seq = Expand::new(from_iter([1]).shared(), chain_up_to(3));
        let out = seq.collect(CancellationToken::new()).await.unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        // Tree: 1 -> [10, 20], 10 -> [100], 20 -> [200], leaves below 100.
        let seq = Expand::new(from_iter([1]).shared(), |x: i32, _ctx| async move {
            Ok::<_, SequenceError>(match x {
                1 => from_iter([10, 20]).shared(),
                10 => from_iter([100]).shared(),
                20 => from_iter([200]).shared(),
                _ => empty().shared(),
            })
        });
        let out = seq.collect(CancellationToken::new()).await.unwrap();
        assert_eq!(out, vec![1, 10, 20, 100, 200]);
    }

    #[tokio::test]
    async fn test_multiple_roots_expand_in_order() {
        let seq = Expand::new(from_iter([1, 2]).shared(), |x: i32, _ctx| async move {
            Ok::<_, SequenceError>(if x < 10 {
                from_iter([x * 10]).shared()
            } else {
                empty().shared()
            })
        });
        let out = seq.collect(CancellationToken::new()).await.unwrap();
        assert_eq!(out, vec![1, 2, 10, 20]);
    }

    #[tokio::test]
    async fn test_selector_runs_before_value_is_yielded() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let seq = Expand::new(from_iter([7]).shared(), move |x: i32, _ctx| {
            log.lock().unwrap().push(x);
            async { Ok::<_, SequenceError>(empty().shared()) }
        });
        let mut cursor = seq.open(CancellationToken::new());
        assert_eq!(cursor.advance().await, Ok(Some(7)));
        assert_eq!(*seen.lock().unwrap(), vec![7]);
        assert_eq!(cursor.advance().await, Ok(None));
    }

    #[tokio::test]
    async fn test_selector_failure_discards_queue() {
        let leaf = Tracked::new(from_iter([99]));
        let handle = leaf.clone();
        let seq = Expand::new(from_iter([1, 2]).shared(), move |x: i32, _ctx| {
            let res = if x == 1 {
                Ok(handle.seq())
            } else {
                Err(SequenceError::selector("no children for 2"))
            };
            async move { res }
        });
        let mut cursor = seq.open(CancellationToken::new());
        assert_eq!(cursor.advance().await, Ok(Some(1)));
        assert_eq!(
            cursor.advance().await,
            Err(SequenceError::selector("no children for 2"))
        );
        assert_eq!(cursor.advance().await, Ok(None));
        // The enqueued child of 1 was discarded, never opened.
        assert_eq!(leaf.opened(), 0);
    }

    #[tokio::test]
    async fn test_inner_failure_is_terminal() {
        let seq = Expand::new(from_iter([1]).shared(), |_x: i32, _ctx| async {
            Ok::<_, SequenceError>(fail(SequenceError::source("child broke")).shared())
        });
        let res = seq.collect(CancellationToken::new()).await;
        assert_eq!(res, Err(SequenceError::source("child broke")));
    }

    #[tokio::test]
    async fn test_selector_panic_becomes_failure() {
        let seq = Expand::new(from_iter([1]).shared(), |x: i32, _ctx| {
            assert!(x > 1, "selector rejects {x}");
            async { Ok::<_, SequenceError>(empty().shared()) }
        });
        let res = seq.collect(CancellationToken::new()).await;
        assert_eq!(
            res,
            Err(SequenceError::Panicked {
                error: "selector rejects 1".into()
            })
        );
    }

    #[tokio::test]
    async fn test_cancel_releases_every_opened_inner() {
        let tracked_seqs: Arc<Mutex<Vec<Tracked<i32>>>> = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::clone(&tracked_seqs);
        let root = Tracked::new(from_iter([0, 1, 2]));
        let seq = Expand::new(root.seq(), move |x: i32, _ctx| {
            let tracked = Tracked::new(from_iter([x + 10, x + 20]));
            registry.lock().unwrap().push(tracked.clone());
            async move { Ok::<_, SequenceError>(tracked.seq()) }
        });

        let ctx = CancellationToken::new();
        let mut cursor = seq.open(ctx.clone());
        // root yields 0, 1, 2 then the first child starts.
        for expected in [0, 1, 2, 10] {
            assert_eq!(cursor.advance().await, Ok(Some(expected)));
        }
        ctx.cancel();
        assert_eq!(cursor.advance().await, Ok(None));
        cursor.release().await;

        assert_eq!((root.opened(), root.released()), (1, 1));
        let opened: usize = tracked_seqs.lock().unwrap().iter().map(|p| p.opened()).sum();
        let released: usize = tracked_seqs.lock().unwrap().iter().map(|p| p.released()).sum();
        assert_eq!(opened, 1);
        assert_eq!(released, opened);
    }

    #[tokio::test]
    async fn test_selector_receives_token() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let seq = Expand::new(from_iter([1, 2, 3]).shared(), move |_x: i32, ctx: CancellationToken| {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.cancel();
            async { Ok::<_, SequenceError>(empty().shared()) }
        });
        let out = seq.collect(CancellationToken::new()).await.unwrap();
        // The first selector call cancels the consumption after yielding 1.
        assert_eq!(out, vec![1]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deep_chain_has_constant_stack() {
        let seq = Expand::new(from_iter([0]).shared(), chain_up_to(20_000));
        let out = seq.collect(CancellationToken::new()).await.unwrap();
        assert_eq!(out.len(), 20_001);
        assert_eq!(out.last(), Some(&20_000));
    }

    #[tokio::test]
    async fn test_queue_warning_does_not_bound() {
        let cfg = Config {
            expand_queue_warn: 2,
            ..Config::default()
        };
        let seq = Expand::new(from_iter([1, 2, 3, 4, 5]).shared(), |_x: i32, _ctx| async {
            Ok::<_, SequenceError>(empty().shared())
        })
        .with_config(&cfg);
        let out = seq.collect(CancellationToken::new()).await.unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_concurrent_consumptions_are_independent() {
        let seq = Expand::new(from_iter([1, 2]).shared(), |x: i32, _ctx| async move {
            Ok::<_, SequenceError>(if x < 8 {
                from_iter([x * 2, x * 2 + 1]).shared()
            } else {
                empty().shared()
            })
        });
        let (left, right) = drain_interleaved(&seq).await;
        assert_eq!(left, vec![1, 2, 2, 3, 4, 5, 4, 5, 6, 7, 8, 9, 10, 11, 8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(right, left);
    }
}
