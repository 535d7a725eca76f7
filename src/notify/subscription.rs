//! # Subscription handles.
//!
//! A [`Subscription`] owns whatever an attachment allocated. Releasing it is
//! idempotent and safe whether the attachment succeeded, failed or finished.
//!
//! Provided handles:
//! - [`NopSubscription`] - owns nothing (returned after a failed attachment)
//! - [`FnSubscription`] - runs a closure on the first release only
//! - [`CancelSubscription`] - cancels a token; never waits for the cancelled work

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Handle for one active attachment.
#[async_trait]
pub trait Subscription: Send + Sync + 'static {
    /// Releases owned resources. Repeated calls do nothing.
    async fn release(&self);
}

/// Shared handle to a subscription (`Arc<dyn Subscription>`).
pub type SubscriptionRef = Arc<dyn Subscription>;

/// Subscription that owns nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopSubscription;

impl NopSubscription {
    /// Returns a shared no-op handle.
    pub fn arc() -> SubscriptionRef {
        Arc::new(NopSubscription)
    }
}

#[async_trait]
impl Subscription for NopSubscription {
    async fn release(&self) {}
}

/// Subscription that runs `f` on its first release.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use seqflow::{FnSubscription, Subscription};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&hits);
/// let sub = FnSubscription::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
/// sub.release().await;
/// sub.release().await;
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// # }
/// ```
pub struct FnSubscription<F> {
    f: Mutex<Option<F>>,
}

impl<F> FnSubscription<F>
where
    F: FnOnce() + Send + 'static,
{
    /// Wraps `f`; it runs at most once.
    pub fn new(f: F) -> Self {
        Self {
            f: Mutex::new(Some(f)),
        }
    }

    /// Same as [`new`](Self::new), returned as a shared handle.
    pub fn arc(f: F) -> SubscriptionRef {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F> Subscription for FnSubscription<F>
where
    F: FnOnce() + Send + 'static,
{
    async fn release(&self) {
        let f = self.f.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(f) = f {
            f();
        }
    }
}

/// Subscription that cancels a token on release.
///
/// Cancellation is idempotent, so is this release. It does not wait for the
/// cancelled work to stop; that keeps release safe to call from inside a
/// notification handler running on the work being cancelled.
#[derive(Debug, Clone)]
pub struct CancelSubscription {
    token: CancellationToken,
}

impl CancelSubscription {
    /// Releasing this subscription cancels `token`.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Same as [`new`](Self::new), returned as a shared handle.
    pub fn arc(token: CancellationToken) -> SubscriptionRef {
        Arc::new(Self::new(token))
    }

    /// True once the token is cancelled, by this release or by anyone else.
    ///
    /// # Example
    /// ```
    /// use seqflow::{CancelSubscription, Subscription};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let token = CancellationToken::new();
    /// let sub = CancelSubscription::new(token.clone());
    /// assert!(!sub.is_released());
    /// sub.release().await;
    /// assert!(sub.is_released() && token.is_cancelled());
    /// # }
    /// ```
    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[async_trait]
impl Subscription for CancelSubscription {
    async fn release(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("subscription released");
        }
        self.token.cancel();
    }
}
