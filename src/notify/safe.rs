//! # Safe subscription.
//!
//! [`subscribe_safe`] attaches a consumer to a producer and guarantees that an
//! attachment failure reaches the consumer as its single `on_error` call instead
//! of surfacing to the caller.
//!
//! ## Flow
//! ```text
//! subscribe_safe(producer, consumer)
//!   └─► guard = GuardedConsumer(consumer)
//!       └─► producer.subscribe(guard)   (panics captured when enabled)
//!             ├─ Ok(sub)  ──► sub
//!             ├─ Err(e), consumer handler panicked ──► resume the panic
//!             └─ Err(e)   ──► guard.on_error(e)  (dropped if already terminated)
//!                             └─► NopSubscription
//! ```
//!
//! Consumer handlers are never treated as attachment failures. A panic raised
//! by the consumer, whether the producer invoked it during `subscribe` or the
//! routed `on_error` raised it, unwinds to the caller of `subscribe_safe`.

use std::panic;
use std::sync::Arc;

use crate::config::Config;
use crate::guard;

use super::{Consumer, ConsumerRef, GuardedConsumer, NopSubscription, Producer, SubscriptionRef};

/// Attaches `consumer` to `producer`, routing attachment failure to the consumer.
///
/// Uses `Config::default()`; see [`subscribe_safe_with`].
///
/// # Example
/// ```
/// use seqflow::{ConsumerRef, ProducerFn, SequenceError, SubscriptionRef, subscribe_safe};
/// # use async_trait::async_trait;
/// # use seqflow::Consumer;
/// # struct Log;
/// # #[async_trait]
/// # impl Consumer<u8> for Log {
/// #     async fn on_next(&self, _: u8) {}
/// #     async fn on_error(&self, e: SequenceError) { println!("{e}"); }
/// #     async fn on_completed(&self) {}
/// # }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let broken = ProducerFn::new("broken", |_c: ConsumerRef<u8>| async {
///     Err::<SubscriptionRef, _>(SequenceError::subscribe("no socket"))
/// });
/// // Prints "subscribe failed: no socket"; nothing is returned as an error.
/// let log: ConsumerRef<u8> = std::sync::Arc::new(Log);
/// let sub = subscribe_safe(&broken, log).await;
/// sub.release().await;
/// # }
/// ```
pub async fn subscribe_safe<T, P>(producer: &P, consumer: ConsumerRef<T>) -> SubscriptionRef
where
    T: Send + 'static,
    P: Producer<T> + ?Sized,
{
    subscribe_safe_with(producer, consumer, &Config::default()).await
}

/// Same as [`subscribe_safe`], with explicit configuration (panic capture).
pub async fn subscribe_safe_with<T, P>(
    producer: &P,
    consumer: ConsumerRef<T>,
    cfg: &Config,
) -> SubscriptionRef
where
    T: Send + 'static,
    P: Producer<T> + ?Sized,
{
    let guarded = GuardedConsumer::arc(consumer);
    let handle: ConsumerRef<T> = Arc::clone(&guarded) as ConsumerRef<T>;

    match guard::call_async(cfg.catch_panics, || producer.subscribe(handle)).await {
        Ok(sub) => sub,
        Err(e) => {
            if let Some(message) = guarded.take_handler_panic() {
                tracing::debug!(producer = producer.name(), "consumer handler panicked during attachment");
                panic::resume_unwind(Box::new(message));
            }
            tracing::debug!(
                producer = producer.name(),
                error = %e,
                label = e.as_label(),
                "attachment failed; routing to consumer"
            );
            guarded.on_error(e).await;
            NopSubscription::arc()
        }
    }
}
