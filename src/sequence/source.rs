//! # Leaf sequences.
//!
//! - [`from_iter`] replays a fixed list of values on every consumption
//! - [`empty`] completes immediately
//! - [`fail`] fails immediately with a fixed error
//! - [`from_stream`] builds a fresh [`futures::Stream`] per consumption
//!
//! Leaf cursors own no inner cursors; releasing one only marks it finished
//! (and drops the underlying stream, for [`StreamSequence`]).

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::SequenceError;
use crate::guard;

use super::{BoxCursor, Cursor, Sequence};

/// Sequence replaying a fixed list of values.
#[derive(Debug)]
pub struct Values<T> {
    items: Arc<[T]>,
}

/// Creates a sequence that yields `items` in order on every consumption.
///
/// # Example
/// ```
/// use seqflow::{SequenceExt, from_iter};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let out = from_iter(1..=3).collect(CancellationToken::new()).await.unwrap();
/// assert_eq!(out, vec![1, 2, 3]);
/// # }
/// ```
pub fn from_iter<T, I>(items: I) -> Values<T>
where
    I: IntoIterator<Item = T>,
{
    Values {
        items: items.into_iter().collect(),
    }
}

impl<T> Sequence<T> for Values<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T> {
        Box::new(ValuesCursor {
            items: Arc::clone(&self.items),
            pos: 0,
            ctx,
        })
    }
}

struct ValuesCursor<T> {
    items: Arc<[T]>,
    pos: usize,
    ctx: CancellationToken,
}

#[async_trait]
impl<T> Cursor<T> for ValuesCursor<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn advance(&mut self) -> Result<Option<T>, SequenceError> {
        if self.ctx.is_cancelled() {
            self.release().await;
            return Ok(None);
        }
        let next = self.items.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        Ok(next)
    }

    async fn release(&mut self) {
        self.pos = self.items.len();
    }
}

/// Sequence that completes without producing values.
#[derive(Debug)]
pub struct Empty<T>(PhantomData<fn() -> T>);

/// Creates a sequence that completes immediately.
pub fn empty<T>() -> Empty<T> {
    Empty(PhantomData)
}

impl<T> Sequence<T> for Empty<T>
where
    T: Send + 'static,
{
    fn open(&self, _ctx: CancellationToken) -> BoxCursor<T> {
        Box::new(EmptyCursor(PhantomData))
    }
}

struct EmptyCursor<T>(PhantomData<fn() -> T>);

#[async_trait]
impl<T> Cursor<T> for EmptyCursor<T>
where
    T: Send + 'static,
{
    async fn advance(&mut self) -> Result<Option<T>, SequenceError> {
        Ok(None)
    }

    async fn release(&mut self) {}
}

/// Sequence that fails on its first advance.
#[derive(Debug)]
pub struct Fail<T> {
    error: SequenceError,
    _marker: PhantomData<fn() -> T>,
}

/// Creates a sequence whose every consumption fails with `error`.
pub fn fail<T>(error: SequenceError) -> Fail<T> {
    Fail {
        error,
        _marker: PhantomData,
    }
}

impl<T> Sequence<T> for Fail<T>
where
    T: Send + 'static,
{
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T> {
        Box::new(FailCursor {
            error: Some(self.error.clone()),
            ctx,
            _marker: PhantomData,
        })
    }
}

struct FailCursor<T> {
    error: Option<SequenceError>,
    ctx: CancellationToken,
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T> Cursor<T> for FailCursor<T>
where
    T: Send + 'static,
{
    async fn advance(&mut self) -> Result<Option<T>, SequenceError> {
        if self.ctx.is_cancelled() {
            self.error = None;
            return Ok(None);
        }
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    async fn release(&mut self) {
        self.error = None;
    }
}

type StreamFactory<T> = Arc<dyn Fn() -> BoxStream<'static, Result<T, SequenceError>> + Send + Sync>;

/// Sequence backed by a stream factory; see [`from_stream`].
pub struct StreamSequence<T> {
    factory: StreamFactory<T>,
    catch_panics: bool,
}

/// Creates a sequence that calls `factory` for a fresh stream per consumption.
///
/// The factory runs on the cursor's first `advance`, not on `open`. While
/// awaiting the next item the cursor also watches its cancellation token, so a
/// pending stream does not delay cancellation. A panic raised by the factory
/// is captured like any other user callback (see [`Config::catch_panics`]).
///
/// # Example
/// ```
/// use futures::stream;
/// use seqflow::{SequenceError, SequenceExt, from_stream};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let seq = from_stream(|| stream::iter([Ok::<_, SequenceError>(1), Ok(2)]));
/// let out = seq.collect(CancellationToken::new()).await.unwrap();
/// assert_eq!(out, vec![1, 2]);
/// # }
/// ```
pub fn from_stream<F, S, T>(factory: F) -> StreamSequence<T>
where
    F: Fn() -> S + Send + Sync + 'static,
    S: Stream<Item = Result<T, SequenceError>> + Send + 'static,
{
    StreamSequence {
        factory: Arc::new(move || factory().boxed()),
        catch_panics: Config::default().catch_panics,
    }
}

impl<T> StreamSequence<T> {
    /// Applies crate configuration (panic capture).
    pub fn with_config(mut self, cfg: &Config) -> Self {
        self.catch_panics = cfg.catch_panics;
        self
    }
}

impl<T> Sequence<T> for StreamSequence<T>
where
    T: Send + 'static,
{
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T> {
        Box::new(StreamCursor {
            state: StreamState::Pending(Arc::clone(&self.factory)),
            catch_panics: self.catch_panics,
            ctx,
        })
    }
}

enum StreamState<T> {
    Pending(StreamFactory<T>),
    Active(BoxStream<'static, Result<T, SequenceError>>),
    Done,
}

struct StreamCursor<T> {
    state: StreamState<T>,
    catch_panics: bool,
    ctx: CancellationToken,
}

#[async_trait]
impl<T> Cursor<T> for StreamCursor<T>
where
    T: Send + 'static,
{
    async fn advance(&mut self) -> Result<Option<T>, SequenceError> {
        if self.ctx.is_cancelled() {
            self.release().await;
            return Ok(None);
        }
        if let StreamState::Pending(factory) = &self.state {
            let factory = Arc::clone(factory);
            match guard::call(self.catch_panics, || Ok(factory())) {
                Ok(stream) => self.state = StreamState::Active(stream),
                Err(e) => {
                    self.state = StreamState::Done;
                    return Err(e);
                }
            }
        }
        let StreamState::Active(stream) = &mut self.state else {
            return Ok(None);
        };
        let next = tokio::select! {
            biased;
            _ = self.ctx.cancelled() => None,
            item = stream.next() => Some(item),
        };
        match next {
            Some(Some(Ok(v))) => Ok(Some(v)),
            Some(Some(Err(e))) => {
                self.release().await;
                Err(e)
            }
            Some(None) | None => {
                self.release().await;
                Ok(None)
            }
        }
    }

    async fn release(&mut self) {
        self.state = StreamState::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::SequenceExt;

    #[tokio::test]
    async fn test_values_replay_per_consumption() {
        let seq = from_iter(vec!["x", "y"]);
        let ctx = CancellationToken::new();
        assert_eq!(seq.collect(ctx.clone()).await.unwrap(), vec!["x", "y"]);
        assert_eq!(seq.collect(ctx).await.unwrap(), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_values_stop_on_cancel() {
        let seq = from_iter([1, 2, 3]);
        let ctx = CancellationToken::new();
        let mut cursor = seq.open(ctx.clone());
        assert_eq!(cursor.advance().await, Ok(Some(1)));
        ctx.cancel();
        assert_eq!(cursor.advance().await, Ok(None));
        assert_eq!(cursor.advance().await, Ok(None));
    }

    #[tokio::test]
    async fn test_empty_completes() {
        let out = empty::<u8>().collect(CancellationToken::new()).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_fail_fails_once_then_ends() {
        let seq = fail::<u8>(SequenceError::source("nope"));
        let mut cursor = seq.open(CancellationToken::new());
        assert_eq!(cursor.advance().await, Err(SequenceError::source("nope")));
        assert_eq!(cursor.advance().await, Ok(None));
    }

    #[tokio::test]
    async fn test_stream_factory_runs_per_consumption() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let seq = from_stream(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::stream::iter([Ok::<_, SequenceError>(10), Ok(20)])
        });
        let ctx = CancellationToken::new();
        assert_eq!(seq.collect(ctx.clone()).await.unwrap(), vec![10, 20]);
        assert_eq!(seq.collect(ctx).await.unwrap(), vec![10, 20]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pending_stream_yields_to_cancel() {
        let seq = from_stream(futures::stream::pending::<Result<u8, SequenceError>>);
        let ctx = CancellationToken::new();
        let mut cursor = seq.open(ctx.clone());
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            canceller.cancel();
        });
        assert_eq!(cursor.advance().await, Ok(None));
    }

    #[tokio::test]
    async fn test_stream_factory_panic_is_captured() {
        let seq = from_stream(|| -> futures::stream::Empty<Result<u8, SequenceError>> {
            panic!("no stream today")
        });
        let mut cursor = seq.open(CancellationToken::new());
        assert_eq!(
            cursor.advance().await,
            Err(SequenceError::Panicked {
                error: "no stream today".into()
            })
        );
        assert_eq!(cursor.advance().await, Ok(None));
    }
}
