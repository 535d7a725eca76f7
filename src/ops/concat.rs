//! # Concat: sequential flatten.
//!
//! [`Concat`] produces every value of the first inner sequence, then every value
//! of the second, and so on. Inner sequences come either from a fixed ordered
//! collection ([`Concat::of`]) or from a pull sequence of sequences
//! ([`Concat::flatten`]).
//!
//! ## State machine
//! ```text
//! Idle ──next source──► Active(inner) ──inner exhausted──► Idle
//!   │                        │
//!   └─ no more sources ─► Done ◄── inner failed / cancelled
//! ```
//!
//! ## Rules
//! - An inner sequence is opened only after the previous one is exhausted.
//! - The first failure (inner or outer) ends the consumption; later inner
//!   sequences are never opened.
//! - Inner cursors get a child of the outer token.

use std::mem;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SequenceError;
use crate::sequence::{BoxCursor, Cursor, Sequence, SequenceRef};

enum Sources<T> {
    Fixed(Arc<[SequenceRef<T>]>),
    Nested(SequenceRef<SequenceRef<T>>),
}

/// Sequential concatenation of inner sequences.
///
/// # Example
/// ```
/// use seqflow::{Concat, SequenceExt, from_iter};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let seq = Concat::of([from_iter([1, 2]).shared(), from_iter([3]).shared()]);
/// let out = seq.collect(CancellationToken::new()).await.unwrap();
/// assert_eq!(out, vec![1, 2, 3]);
/// # }
/// ```
pub struct Concat<T> {
    sources: Sources<T>,
}

impl<T> Concat<T> {
    /// Concatenates a fixed, ordered collection of sequences.
    ///
    /// Accepts any `IntoIterator`, so array literals cover the variadic form.
    pub fn of<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = SequenceRef<T>>,
    {
        Self {
            sources: Sources::Fixed(sources.into_iter().collect()),
        }
    }

    /// Concatenates the sequences produced by a sequence of sequences.
    ///
    /// The outer sequence is advanced only when the current inner sequence is
    /// exhausted; its failure ends the consumption like an inner failure.
    pub fn flatten(sources: SequenceRef<SequenceRef<T>>) -> Self {
        Self {
            sources: Sources::Nested(sources),
        }
    }
}

impl<T> Sequence<T> for Concat<T>
where
    T: Send + 'static,
{
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T> {
        let outer = match &self.sources {
            Sources::Fixed(list) => Outer::Fixed {
                list: Arc::clone(list),
                next: 0,
            },
            Sources::Nested(seq) => Outer::Nested(seq.open(ctx.child_token())),
        };
        Box::new(ConcatCursor {
            outer,
            state: ConcatState::Idle,
            ctx,
        })
    }
}

enum Outer<T> {
    Fixed {
        list: Arc<[SequenceRef<T>]>,
        next: usize,
    },
    Nested(BoxCursor<SequenceRef<T>>),
}

impl<T> Outer<T>
where
    T: Send + 'static,
{
    async fn next_source(&mut self) -> Result<Option<SequenceRef<T>>, SequenceError> {
        match self {
            Outer::Fixed { list, next } => {
                let seq = list.get(*next).cloned();
                if seq.is_some() {
                    *next += 1;
                }
                Ok(seq)
            }
            Outer::Nested(cursor) => cursor.advance().await,
        }
    }
}

enum ConcatState<T> {
    Idle,
    Active(BoxCursor<T>),
    Done,
}

struct ConcatCursor<T> {
    outer: Outer<T>,
    state: ConcatState<T>,
    ctx: CancellationToken,
}

#[async_trait]
impl<T> Cursor<T> for ConcatCursor<T>
where
    T: Send + 'static,
{
    async fn advance(&mut self) -> Result<Option<T>, SequenceError> {
        loop {
            if self.ctx.is_cancelled() {
                self.release().await;
                return Ok(None);
            }
            match &mut self.state {
                ConcatState::Done => return Ok(None),
                ConcatState::Idle => match self.outer.next_source().await {
                    Ok(Some(seq)) => {
                        tracing::debug!("concat: opening next inner sequence");
                        self.state = ConcatState::Active(seq.open(self.ctx.child_token()));
                    }
                    Ok(None) => {
                        self.release().await;
                        return Ok(None);
                    }
                    Err(e) => {
                        self.release().await;
                        return Err(e);
                    }
                },
                ConcatState::Active(inner) => match inner.advance().await {
                    Ok(Some(v)) => return Ok(Some(v)),
                    Ok(None) => {
                        inner.release().await;
                        self.state = ConcatState::Idle;
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "concat: inner sequence failed");
                        self.release().await;
                        return Err(e);
                    }
                },
            }
        }
    }

    async fn release(&mut self) {
        match mem::replace(&mut self.state, ConcatState::Done) {
            ConcatState::Done => return,
            ConcatState::Active(mut inner) => inner.release().await,
            ConcatState::Idle => {}
        }
        if let Outer::Nested(outer) = &mut self.outer {
            outer.release().await;
        }
    }
}
