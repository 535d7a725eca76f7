//! Panic capture for user callbacks.
//!
//! Factories, selectors, generation functions and producer attachment run user
//! code. When [`Config::catch_panics`](crate::Config::catch_panics) is on, a panic
//! raised there is converted into [`SequenceError::Panicked`] and becomes the
//! terminal failure of the consumption, instead of unwinding through the caller.
//!
//! Consumer notification handlers are deliberately never routed through here.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;

use crate::error::SequenceError;

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> SequenceError {
    let error = panic_message(payload.as_ref());
    tracing::debug!(%error, "captured panic in user callback");
    SequenceError::Panicked { error }
}

/// Runs a synchronous callback, capturing a panic when `enabled`.
pub(crate) fn call<T>(
    enabled: bool,
    f: impl FnOnce() -> Result<T, SequenceError>,
) -> Result<T, SequenceError> {
    if !enabled {
        return f();
    }
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(res) => res,
        Err(payload) => Err(panicked(payload)),
    }
}

/// Builds and awaits a future, capturing a panic from either step when `enabled`.
///
/// `make` is invoked inside the guard too, so a callback that panics before
/// returning its future is handled the same as one that panics while polled.
pub(crate) async fn call_async<T, Fut>(
    enabled: bool,
    make: impl FnOnce() -> Fut,
) -> Result<T, SequenceError>
where
    Fut: Future<Output = Result<T, SequenceError>>,
{
    if !enabled {
        return make().await;
    }
    let fut = match panic::catch_unwind(AssertUnwindSafe(make)) {
        Ok(fut) => fut,
        Err(payload) => return Err(panicked(payload)),
    };
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(panicked(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_passes_results_through() {
        assert_eq!(call(true, || Ok::<_, SequenceError>(7)), Ok(7));
        assert_eq!(
            call::<()>(true, || Err(SequenceError::generator("no"))),
            Err(SequenceError::generator("no"))
        );
    }

    #[test]
    fn test_call_captures_panic() {
        let res = call::<()>(true, || panic!("kaboom"));
        assert_eq!(
            res,
            Err(SequenceError::Panicked {
                error: "kaboom".into()
            })
        );
    }

    #[test]
    fn test_formatted_panic_payload() {
        let n = 3;
        let res = call::<()>(true, || panic!("bad step {n}"));
        assert_eq!(
            res,
            Err(SequenceError::Panicked {
                error: "bad step 3".into()
            })
        );
    }

    #[tokio::test]
    async fn test_call_async_captures_panic_while_polled() {
        let fail = true;
        let res = call_async(true, || async move {
            tokio::task::yield_now().await;
            if fail {
                panic!("late");
            }
            Ok::<(), SequenceError>(())
        })
        .await;
        assert!(matches!(res, Err(SequenceError::Panicked { .. })));
    }

    #[tokio::test]
    async fn test_call_async_captures_panic_before_future() {
        fn make() -> futures::future::Ready<Result<(), SequenceError>> {
            panic!("early")
        }
        let res = call_async(true, make).await;
        assert_eq!(
            res,
            Err(SequenceError::Panicked {
                error: "early".into()
            })
        );
    }
}
