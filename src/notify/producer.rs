//! # Producer trait and function-backed producer.
//!
//! A [`Producer`] attaches a consumer and returns the [`Subscription`] that owns
//! the attachment, or fails outright. Producers are stateless descriptions; each
//! call to `subscribe` is an independent attachment.
//!
//! Calling `subscribe` directly leaves attachment failures to the caller. Use
//! [`subscribe_safe`](crate::subscribe_safe) to have them delivered to the
//! consumer instead.
//!
//! [`Subscription`]: crate::Subscription

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SequenceError;

use super::{ConsumerRef, SubscriptionRef};

/// # Push-side source of notifications.
#[async_trait]
pub trait Producer<T>: Send + Sync + 'static {
    /// Attaches `consumer`.
    ///
    /// `Err` means the attachment never started; nothing was allocated that the
    /// caller would need to release.
    async fn subscribe(&self, consumer: ConsumerRef<T>) -> Result<SubscriptionRef, SequenceError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a producer (`Arc<dyn Producer<T>>`).
pub type ProducerRef<T> = Arc<dyn Producer<T>>;

/// Function-backed producer.
///
/// Wraps a closure that performs one attachment per call.
///
/// # Example
/// ```
/// use seqflow::{Consumer, ConsumerRef, NopSubscription, ProducerFn, ProducerRef, SequenceError};
///
/// let p: ProducerRef<u8> = ProducerFn::arc("ticks", |consumer: ConsumerRef<u8>| async move {
///     consumer.on_next(1).await;
///     consumer.on_completed().await;
///     Ok::<_, SequenceError>(NopSubscription::arc())
/// });
/// assert_eq!(p.name(), "ticks");
/// ```
#[derive(Debug)]
pub struct ProducerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ProducerFn<F> {
    /// Creates a producer named `name` whose attachments run `f`.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the producer and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<T, F, Fut> Producer<T> for ProducerFn<F>
where
    T: Send + 'static,
    F: Fn(ConsumerRef<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SubscriptionRef, SequenceError>> + Send + 'static,
{
    async fn subscribe(&self, consumer: ConsumerRef<T>) -> Result<SubscriptionRef, SequenceError> {
        (self.f)(consumer).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
