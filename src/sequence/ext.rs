//! # Extension methods for every [`Sequence`].
//!
//! Consumption helpers (`collect`, `for_each`, `into_stream`) drive a cursor to
//! its end and always release it. Fluent constructors wrap `self` into the
//! matching combinator.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::SequenceError;
use crate::notify::SequenceProducer;
use crate::ops::{Concat, Expand, IgnoreElements};

use super::{Sequence, SequenceRef};

/// Helpers available on every [`Sequence`].
#[async_trait]
pub trait SequenceExt<T>: Sequence<T>
where
    T: Send + 'static,
{
    /// Drives one consumption to its end and gathers the values.
    ///
    /// Cancellation ends the consumption early with the values seen so far.
    async fn collect(&self, ctx: CancellationToken) -> Result<Vec<T>, SequenceError> {
        let mut cursor = self.open(ctx);
        let mut out = Vec::new();
        let res = loop {
            match cursor.advance().await {
                Ok(Some(v)) => out.push(v),
                Ok(None) => break Ok(out),
                Err(e) => break Err(e),
            }
        };
        cursor.release().await;
        res
    }

    /// Drives one consumption, awaiting `f` for every value in order.
    async fn for_each<F, Fut>(&self, ctx: CancellationToken, f: F) -> Result<(), SequenceError>
    where
        F: FnMut(T) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let mut f = f;
        let mut cursor = self.open(ctx);
        let res = loop {
            match cursor.advance().await {
                Ok(Some(v)) => f(v).await,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        cursor.release().await;
        res
    }

    /// Opens one consumption and exposes it as a [`futures::Stream`].
    ///
    /// The stream yields `Err` at most once, as its last item, and releases the
    /// cursor when it ends. Dropping the stream early drops the cursor without
    /// an explicit release; cancel `ctx` first when inner resources matter.
    fn into_stream(&self, ctx: CancellationToken) -> BoxStream<'static, Result<T, SequenceError>> {
        let cursor = self.open(ctx);
        stream::unfold(Some(cursor), |state| async move {
            let mut cursor = state?;
            match cursor.advance().await {
                Ok(Some(v)) => Some((Ok(v), Some(cursor))),
                Ok(None) => {
                    cursor.release().await;
                    None
                }
                Err(e) => {
                    cursor.release().await;
                    Some((Err(e), None))
                }
            }
        })
        .boxed()
    }

    /// Wraps `self` into a shared [`SequenceRef`].
    fn shared(self) -> SequenceRef<T>
    where
        Self: Sized,
    {
        Arc::new(self)
    }

    /// Sequence producing all of `self`, then all of `next`.
    fn concat_with(self, next: SequenceRef<T>) -> Concat<T>
    where
        Self: Sized,
    {
        Concat::of([self.shared(), next])
    }

    /// Breadth-first expansion of `self` through `selector`.
    ///
    /// See [`Expand::new`] for the selector contract.
    fn expand<F, Fut>(self, selector: F) -> Expand<T>
    where
        Self: Sized,
        T: Clone,
        F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SequenceRef<T>, SequenceError>> + Send + 'static,
    {
        Expand::new(self.shared(), selector)
    }

    /// Drives `self` for its terminal notification only.
    fn ignore_elements(self) -> IgnoreElements<T>
    where
        Self: Sized,
    {
        IgnoreElements::new(self.shared())
    }

    /// Exposes `self` as a push-based [`Producer`](crate::Producer).
    fn to_producer(self) -> SequenceProducer<T>
    where
        Self: Sized,
    {
        SequenceProducer::new(self.shared())
    }
}

impl<T, S> SequenceExt<T> for S
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
{
}
