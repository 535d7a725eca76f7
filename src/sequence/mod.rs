//! # Pull-based sequences and their cursors.
//!
//! This module provides the pull half of the crate:
//! - [`Sequence`] - reusable, stateless description of values produced on demand
//! - [`Cursor`] - per-consumption iteration state (`advance` / `release`)
//! - [`SequenceExt`] - consumption helpers and fluent combinator constructors
//! - sources: [`from_iter`], [`empty`], [`fail`], [`from_stream`]
//!
//! ## Consumption
//! ```text
//! Sequence ──open(ctx)──► Cursor ──advance()──► Ok(Some(v))  value
//!                            │                  Ok(None)     exhausted or cancelled
//!                            │                  Err(e)       terminal failure
//!                            └──release()──► owned inner cursors released (idempotent)
//! ```
//!
//! ## Rules
//! - A cursor checks `ctx.is_cancelled()` at the top of every `advance`.
//! - Once a cursor has returned `Ok(None)` or `Err(_)` it keeps returning `Ok(None)`.
//! - Nested cursors are opened with `ctx.child_token()`: cancellation flows down, never up.

mod cursor;
mod ext;
mod source;

pub use cursor::{BoxCursor, Cursor};
pub use ext::SequenceExt;
pub use source::{Empty, Fail, StreamSequence, Values, empty, fail, from_iter, from_stream};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// # Reusable description of a sequence.
///
/// Each call to [`open`](Sequence::open) yields a fresh, independent [`Cursor`];
/// a `Sequence` holds no iteration state of its own, so it may be opened many
/// times, concurrently.
///
/// Opening must not run user code eagerly: factories, selectors and streams are
/// first touched by the cursor's first `advance`.
///
/// # Example
/// ```
/// use seqflow::{Sequence, SequenceExt, from_iter};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let seq = from_iter([1, 2, 3]);
/// let ctx = CancellationToken::new();
/// assert_eq!(seq.collect(ctx.clone()).await.unwrap(), vec![1, 2, 3]);
/// // Reusable: a second consumption starts over.
/// assert_eq!(seq.collect(ctx).await.unwrap(), vec![1, 2, 3]);
/// # }
/// ```
pub trait Sequence<T>: Send + Sync + 'static {
    /// Begins one consumption, bound to the cancellation token `ctx`.
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T>;
}

/// Shared handle to a sequence (`Arc<dyn Sequence<T>>`).
pub type SequenceRef<T> = Arc<dyn Sequence<T>>;

impl<T, S> Sequence<T> for Arc<S>
where
    S: Sequence<T> + ?Sized,
{
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T> {
        (**self).open(ctx)
    }
}
