//! # Sequence → Producer bridge.
//!
//! [`SequenceProducer`] exposes any pull [`Sequence`](crate::Sequence) as a push
//! [`Producer`]. Each attachment opens a fresh cursor and spawns a driver task
//! that pulls values and forwards them to the consumer.
//!
//! ## Driver
//! ```text
//! loop {
//!   select! {
//!     token cancelled   ─► stop (no terminal notification)
//!     cursor.advance()  ─► Ok(Some(v)) ─► consumer.on_next(v), yield
//!                          Ok(None)    ─► consumer.on_completed(), stop
//!                          Err(e)      ─► consumer.on_error(e), stop
//!   }
//! }
//! cursor.release()      (always, even if a consumer handler panicked)
//! ```
//!
//! Releasing the returned subscription cancels the driver's token. The cursor
//! is released by the driver itself, never by the subscription.

use std::panic::{self, AssertUnwindSafe};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error::SequenceError;
use crate::sequence::{BoxCursor, SequenceRef};

use super::{CancelSubscription, Consumer, ConsumerRef, Producer, SubscriptionRef};

/// Push-based view over a pull sequence.
///
/// Requires a tokio runtime at attachment time; attaching elsewhere fails with
/// [`SequenceError::Subscribe`].
pub struct SequenceProducer<T> {
    source: SequenceRef<T>,
    parent: Option<CancellationToken>,
}

impl<T> SequenceProducer<T> {
    /// Bridges `source`; each attachment gets its own token.
    pub fn new(source: SequenceRef<T>) -> Self {
        Self {
            source,
            parent: None,
        }
    }

    /// Ties every attachment to `parent`: cancelling it stops all drivers.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }
}

#[async_trait]
impl<T> Producer<T> for SequenceProducer<T>
where
    T: Send + 'static,
{
    async fn subscribe(&self, consumer: ConsumerRef<T>) -> Result<SubscriptionRef, SequenceError> {
        let runtime = Handle::try_current().map_err(SequenceError::subscribe)?;
        let token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let cursor = self.source.open(token.clone());
        runtime.spawn(drive(cursor, consumer, token.clone()));
        Ok(CancelSubscription::arc(token))
    }
}

async fn drive<T>(mut cursor: BoxCursor<T>, consumer: ConsumerRef<T>, ctx: CancellationToken)
where
    T: Send + 'static,
{
    let res = AssertUnwindSafe(forward(&mut cursor, consumer.as_ref(), &ctx))
        .catch_unwind()
        .await;
    cursor.release().await;
    if let Err(payload) = res {
        panic::resume_unwind(payload);
    }
}

async fn forward<T>(cursor: &mut BoxCursor<T>, consumer: &dyn Consumer<T>, ctx: &CancellationToken)
where
    T: Send + 'static,
{
    let mut delivered: u64 = 0;
    loop {
        let step = tokio::select! {
            biased;
            _ = ctx.cancelled() => None,
            res = cursor.advance() => Some(res),
        };
        match step {
            None => {
                tracing::debug!(delivered, "driver cancelled");
                return;
            }
            Some(Ok(Some(value))) => {
                delivered += 1;
                tracing::trace!(delivered, "forwarding value");
                consumer.on_next(value).await;
                // Sequences that never suspend must not starve the runtime.
                tokio::task::yield_now().await;
            }
            Some(Ok(None)) => {
                if !ctx.is_cancelled() {
                    consumer.on_completed().await;
                }
                return;
            }
            Some(Err(e)) => {
                tracing::debug!(error = %e, delivered, "sequence failed");
                consumer.on_error(e).await;
                return;
            }
        }
    }
}
