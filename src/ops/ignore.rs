//! # IgnoreElements: terminal-only projection.
//!
//! [`IgnoreElements`] drives its source to the end, discards every value and
//! reports only how it finished: clean completion, or the source's failure
//! forwarded unchanged.

use std::mem;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SequenceError;
use crate::sequence::{BoxCursor, Cursor, Sequence, SequenceRef};

/// Sequence that never produces a value.
///
/// # Example
/// ```
/// use seqflow::{IgnoreElements, SequenceExt, from_iter};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let seq = IgnoreElements::new(from_iter([1, 2, 3]).shared());
/// let out = seq.collect(CancellationToken::new()).await.unwrap();
/// assert!(out.is_empty());
/// # }
/// ```
pub struct IgnoreElements<T> {
    source: SequenceRef<T>,
}

impl<T> IgnoreElements<T> {
    /// Wraps `source`; its values are dropped and its terminal result kept.
    pub fn new(source: SequenceRef<T>) -> Self {
        Self { source }
    }
}

impl<T> Sequence<T> for IgnoreElements<T>
where
    T: Send + 'static,
{
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T> {
        Box::new(IgnoreCursor {
            inner: Some(self.source.open(ctx.child_token())),
            ctx,
        })
    }
}

struct IgnoreCursor<T> {
    inner: Option<BoxCursor<T>>,
    ctx: CancellationToken,
}

#[async_trait]
impl<T> Cursor<T> for IgnoreCursor<T>
where
    T: Send + 'static,
{
    async fn advance(&mut self) -> Result<Option<T>, SequenceError> {
        loop {
            if self.ctx.is_cancelled() {
                self.release().await;
                return Ok(None);
            }
            let Some(inner) = self.inner.as_mut() else {
                return Ok(None);
            };
            match inner.advance().await {
                Ok(Some(_)) => continue,
                Ok(None) => {
                    self.release().await;
                    return Ok(None);
                }
                Err(e) => {
                    self.release().await;
                    return Err(e);
                }
            }
        }
    }

    async fn release(&mut self) {
        if let Some(mut inner) = mem::take(&mut self.inner) {
            inner.release().await;
        }
    }
}
