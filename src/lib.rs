//! # seqflow
//!
//! **seqflow** is a small library of cancellable async sequences for Rust.
//!
//! It provides two duals over the same failure and release rules:
//! a push channel (`Producer` / `Consumer` / `Subscription`) with a safe
//! attachment helper, and a pull engine (`Sequence` / `Cursor`) with a set of
//! combinators whose cursors are explicit state machines.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!          pull side                                 push side
//! ┌──────────────────────────────┐        ┌───────────────────────────────┐
//! │ Sequence<T>  (reusable)      │        │ Producer<T>  (reusable)       │
//! │   open(ctx) ─► Cursor<T>     │        │   subscribe(consumer)         │
//! │     advance() / release()    │        │     ─► Subscription | Err     │
//! └──────┬───────────────────────┘        └──────────────┬────────────────┘
//!        │ combinators (own inner cursors)               │
//!        ▼                                               ▼
//! ┌──────────────────────────────┐        ┌───────────────────────────────┐
//! │ Concat  Defer  Expand        │        │ subscribe_safe                │
//! │ Generate  IgnoreElements     │        │  - GuardedConsumer: 1 terminal│
//! └──────┬───────────────────────┘        │  - Err/panic ─► on_error      │
//!        │                                │  - NopSubscription on failure │
//!        └──── SequenceProducer ────────► └───────────────────────────────┘
//!              (driver task per attachment)
//! ```
//!
//! ### Cancellation
//! ```text
//! ctx (caller) ──child_token──► inner cursor ──child_token──► nested cursor
//!   cancel() flows down; an inner token never cancels its parent.
//! A cursor that observes cancellation releases what it owns and returns Ok(None).
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                                 |
//! |-------------------|--------------------------------------------------------------|----------------------------------------------------|
//! | **Push channel**  | Attach consumers; failures routed to the consumer.           | [`Producer`], [`Consumer`], [`subscribe_safe`]     |
//! | **Pull engine**   | Reusable sequences, per-consumption cursors.                 | [`Sequence`], [`Cursor`], [`SequenceExt`]          |
//! | **Combinators**   | Concat, defer, breadth-first expand, generate, ignore.       | [`Concat`], [`Defer`], [`Expand`], [`Generate`]    |
//! | **Bridge**        | Drive any sequence as a producer on a tokio task.            | [`SequenceProducer`]                               |
//! | **Errors**        | Typed terminal failures and construction errors.             | [`SequenceError`], [`BuildError`]                  |
//! | **Configuration** | Panic capture and expansion queue warnings.                  | [`Config`]                                         |
//!
//! ## Logging
//! The crate emits [`tracing`] events (`debug` at lifecycle points, `warn` for
//! expansion queue growth, `trace` per forwarded value) and never installs a
//! subscriber.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use seqflow::{Concat, SequenceError, SequenceExt, from_iter, generate};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), SequenceError> {
//!     let ctx = CancellationToken::new();
//!
//!     // 1, 2, then 0, 10, 20
//!     let seq = Concat::of([
//!         from_iter([1, 2]).shared(),
//!         generate(0, |x: &i32| *x < 3, |x| x + 1, |x: &i32| x * 10).shared(),
//!     ]);
//!     assert_eq!(seq.collect(ctx.clone()).await?, vec![1, 2, 0, 10, 20]);
//!
//!     // Breadth-first: each value below 4 expands into its double.
//!     let tree = from_iter([1]).expand(|x: i32, _ctx| async move {
//!         let next = if x < 4 { vec![x * 2] } else { vec![] };
//!         Ok::<_, SequenceError>(from_iter(next).shared())
//!     });
//!     assert_eq!(tree.collect(ctx).await?, vec![1, 2, 4]);
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod guard;
mod notify;
mod ops;
mod sequence;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{BuildError, SequenceError};
pub use notify::{
    CancelSubscription, Consumer, ConsumerRef, FnSubscription, GuardedConsumer, NopSubscription,
    Producer, ProducerFn, ProducerRef, SequenceProducer, Subscription, SubscriptionRef,
    subscribe_safe, subscribe_safe_with,
};
pub use ops::{Concat, Defer, Expand, Generate, GenerateBuilder, IgnoreElements, generate, try_generate};
pub use sequence::{
    BoxCursor, Cursor, Empty, Fail, Sequence, SequenceExt, SequenceRef, StreamSequence, Values,
    empty, fail, from_iter, from_stream,
};
