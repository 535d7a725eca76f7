//! # Consumer trait and the terminal-once guard.
//!
//! A [`Consumer`] receives zero or more `on_next` calls followed by exactly one
//! terminal call (`on_error` or `on_completed`). [`GuardedConsumer`] enforces
//! that shape on behalf of producers that may not.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::SequenceError;
use crate::guard;

/// # Push-side receiver of notifications.
///
/// Handlers are invoked by the producer's delivery context. A panic raised by a
/// handler is a programming error in the consumer and is never caught by this
/// crate.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use seqflow::{Consumer, SequenceError};
///
/// struct Print;
///
/// #[async_trait]
/// impl Consumer<u32> for Print {
///     async fn on_next(&self, value: u32) {
///         println!("value {value}");
///     }
///     async fn on_error(&self, error: SequenceError) {
///         println!("failed: {error}");
///     }
///     async fn on_completed(&self) {
///         println!("done");
///     }
/// }
/// ```
#[async_trait]
pub trait Consumer<T>: Send + Sync + 'static {
    /// Receives one value.
    async fn on_next(&self, value: T);

    /// Receives the terminal failure.
    async fn on_error(&self, error: SequenceError);

    /// Receives the terminal completion.
    async fn on_completed(&self);
}

/// Shared handle to a consumer (`Arc<dyn Consumer<T>>`).
pub type ConsumerRef<T> = Arc<dyn Consumer<T>>;

/// Consumer wrapper that drops every notification after the first terminal one.
///
/// Values arriving after a terminal notification and any second terminal
/// notification are discarded and logged at `debug`.
///
/// A panic raised by the wrapped consumer keeps unwinding; the guard only
/// remembers its message so that [`subscribe_safe`](crate::subscribe_safe) can
/// tell a consumer bug apart from a failing producer.
pub struct GuardedConsumer<T> {
    inner: ConsumerRef<T>,
    done: AtomicBool,
    handler_panic: Mutex<Option<String>>,
}

impl<T> GuardedConsumer<T>
where
    T: Send + 'static,
{
    /// Wraps `inner`; nothing has been delivered yet.
    pub fn new(inner: ConsumerRef<T>) -> Self {
        Self {
            inner,
            done: AtomicBool::new(false),
            handler_panic: Mutex::new(None),
        }
    }

    /// Wraps `inner` and returns the guard as a shared handle.
    pub fn arc(inner: ConsumerRef<T>) -> Arc<Self> {
        Arc::new(Self::new(inner))
    }

    /// True once a terminal notification has been let through.
    pub fn is_terminated(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Message of the panic raised by the wrapped consumer, if any.
    ///
    /// Taking it clears it.
    pub fn take_handler_panic(&self) -> Option<String> {
        self.handler_panic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Claims the single terminal slot.
    fn claim_terminal(&self) -> bool {
        !self.done.swap(true, Ordering::AcqRel)
    }

    /// Runs one handler of the wrapped consumer, recording a panic before
    /// letting it continue.
    async fn deliver<F>(&self, handler: F)
    where
        F: Future<Output = ()>,
    {
        if let Err(payload) = AssertUnwindSafe(handler).catch_unwind().await {
            let message = guard::panic_message(payload.as_ref());
            *self
                .handler_panic
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(message);
            panic::resume_unwind(payload);
        }
    }
}

#[async_trait]
impl<T> Consumer<T> for GuardedConsumer<T>
where
    T: Send + 'static,
{
    async fn on_next(&self, value: T) {
        if self.is_terminated() {
            tracing::debug!("dropped value after terminal notification");
            return;
        }
        self.deliver(self.inner.on_next(value)).await;
    }

    async fn on_error(&self, error: SequenceError) {
        if !self.claim_terminal() {
            tracing::debug!(error = %error, "dropped failure after terminal notification");
            return;
        }
        self.deliver(self.inner.on_error(error)).await;
    }

    async fn on_completed(&self) {
        if !self.claim_terminal() {
            tracing::debug!("dropped completion after terminal notification");
            return;
        }
        self.deliver(self.inner.on_completed()).await;
    }
}
