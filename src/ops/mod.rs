//! # Sequence combinators.
//!
//! Each combinator is a [`Sequence`](crate::Sequence) whose cursor is a small
//! explicit state machine over the cursors it owns.
//!
//! - [`Concat`] - values of each inner sequence in order, one inner at a time
//! - [`Defer`] - builds the real sequence per consumption from a factory
//! - [`Expand`] - breadth-first recursive expansion through a selector
//! - [`Generate`] - values unfolded from initial state, condition, iterate, select
//! - [`IgnoreElements`] - only the terminal notification of the source
//!
//! ## Common rules
//! - Cancellation is checked at the top of `advance` (except `Generate`) and
//!   ends the consumption with `Ok(None)` after releasing owned cursors.
//! - A failure from an inner cursor or a user callback is forwarded unchanged
//!   and is the last thing the cursor reports.
//! - `release` is idempotent and releases every owned cursor exactly once.

mod concat;
mod defer;
mod expand;
mod generate;
mod ignore;

pub use concat::Concat;
pub use defer::Defer;
pub use expand::Expand;
pub use generate::{Generate, GenerateBuilder, generate, try_generate};
pub use ignore::IgnoreElements;
