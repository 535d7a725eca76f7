//! # Push-based notification channel.
//!
//! - [`Producer`] attaches a [`Consumer`] and returns a [`Subscription`], or fails
//! - [`Consumer`] receives values, then exactly one terminal notification
//! - [`Subscription`] owns the attachment's resources; release is idempotent
//!
//! [`subscribe_safe`] is the attachment entry point: it never lets an attachment
//! failure escape to the caller, delivering it to the consumer instead.
//! [`SequenceProducer`] bridges the pull side into this channel.
//!
//! ## Notification shape
//! ```text
//! on_next* (on_error | on_completed)
//! ```

mod bridge;
mod consumer;
mod producer;
mod safe;
mod subscription;

pub use bridge::SequenceProducer;
pub use consumer::{Consumer, ConsumerRef, GuardedConsumer};
pub use producer::{Producer, ProducerFn, ProducerRef};
pub use safe::{subscribe_safe, subscribe_safe_with};
pub use subscription::{CancelSubscription, FnSubscription, NopSubscription, Subscription, SubscriptionRef};
