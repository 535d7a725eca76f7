//! # Cursor: one consumption's mutable state.
//!
//! A [`Cursor`] is created by [`Sequence::open`](crate::Sequence::open) and driven
//! by exactly one consumer. It owns every inner cursor it opened and is the only
//! party allowed to release them.

use async_trait::async_trait;

use crate::error::SequenceError;

/// # Single-consumer iteration state.
///
/// `advance` may suspend while awaiting the next value. Results:
/// - `Ok(Some(v))`: the next value
/// - `Ok(None)`: exhausted, or cancellation was observed (not a failure)
/// - `Err(e)`: terminal failure; no further values follow
///
/// Implementations release their owned resources as soon as they reach a
/// terminal state. `release` may still be called at any time and any number of
/// times; only the first call has an effect.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use seqflow::{Cursor, SequenceError};
///
/// struct Countdown(u32);
///
/// #[async_trait]
/// impl Cursor<u32> for Countdown {
///     async fn advance(&mut self) -> Result<Option<u32>, SequenceError> {
///         if self.0 == 0 {
///             return Ok(None);
///         }
///         self.0 -= 1;
///         Ok(Some(self.0))
///     }
///
///     async fn release(&mut self) {
///         self.0 = 0;
///     }
/// }
/// ```
#[async_trait]
pub trait Cursor<T>: Send {
    /// Requests the next value.
    async fn advance(&mut self) -> Result<Option<T>, SequenceError>;

    /// Releases owned inner cursors and resources. Idempotent.
    async fn release(&mut self);
}

/// Owned, type-erased cursor.
pub type BoxCursor<T> = Box<dyn Cursor<T>>;
