//! Test-only helpers.
//!
//! [`Tracked`] wraps a sequence and counts how many cursors were opened and how
//! many `release` calls reached them, so tests can assert that every opened
//! cursor is released exactly once. [`Recorder`] is a consumer that logs every
//! notification it receives.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SequenceError;
use crate::notify::{Consumer, ConsumerRef};
use crate::sequence::{BoxCursor, Cursor, Sequence, SequenceRef};

struct TrackedState {
    opened: AtomicUsize,
    released: AtomicUsize,
    tokens: Mutex<Vec<CancellationToken>>,
}

/// Counting wrapper around a sequence. Clones share counters.
pub(crate) struct Tracked<T> {
    inner: SequenceRef<T>,
    state: Arc<TrackedState>,
}

impl<T> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Tracked<T>
where
    T: Send + 'static,
{
    pub(crate) fn new(inner: impl Sequence<T>) -> Self {
        Self {
            inner: Arc::new(inner),
            state: Arc::new(TrackedState {
                opened: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
                tokens: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Shared handle counting into the same counters.
    pub(crate) fn seq(&self) -> SequenceRef<T> {
        Arc::new(self.clone())
    }

    pub(crate) fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }

    /// Cancels the token handed to the most recently opened cursor.
    pub(crate) fn cancel_last(&self) {
        if let Some(token) = self.state.tokens.lock().unwrap().last() {
            token.cancel();
        }
    }
}

impl<T> Sequence<T> for Tracked<T>
where
    T: Send + 'static,
{
    fn open(&self, ctx: CancellationToken) -> BoxCursor<T> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.tokens.lock().unwrap().push(ctx.clone());
        Box::new(TrackedCursor {
            inner: self.inner.open(ctx),
            state: Arc::clone(&self.state),
        })
    }
}

struct TrackedCursor<T> {
    inner: BoxCursor<T>,
    state: Arc<TrackedState>,
}

#[async_trait]
impl<T> Cursor<T> for TrackedCursor<T>
where
    T: Send + 'static,
{
    async fn advance(&mut self) -> Result<Option<T>, SequenceError> {
        self.inner.advance().await
    }

    async fn release(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
        self.inner.release().await;
    }
}

/// Opens two cursors on `seq` and advances them alternately until both end.
///
/// Returns the values each consumption saw. Both cursors are released.
pub(crate) async fn drain_interleaved<T, S>(seq: &S) -> (Vec<T>, Vec<T>)
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
{
    let ctx = CancellationToken::new();
    let mut first = seq.open(ctx.clone());
    let mut second = seq.open(ctx);
    let (mut left, mut right) = (Vec::new(), Vec::new());
    let (mut left_done, mut right_done) = (false, false);
    while !(left_done && right_done) {
        if !left_done {
            match first.advance().await.expect("first consumption failed") {
                Some(v) => left.push(v),
                None => left_done = true,
            }
        }
        if !right_done {
            match second.advance().await.expect("second consumption failed") {
                Some(v) => right.push(v),
                None => right_done = true,
            }
        }
    }
    first.release().await;
    second.release().await;
    (left, right)
}

/// Yields to the runtime until `check` holds; fails the test after five seconds.
pub(crate) async fn eventually(mut check: impl FnMut() -> bool) {
    let wait = async {
        while !check() {
            tokio::task::yield_now().await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("condition not reached in time");
}

/// One notification seen by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Note<T> {
    Next(T),
    Error(SequenceError),
    Completed,
}

/// Consumer that records notifications in arrival order.
pub(crate) struct Recorder<T> {
    notes: Mutex<Vec<Note<T>>>,
    done: tokio::sync::Notify,
}

impl<T> Recorder<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn arc() -> Arc<Self> {
        Arc::new(Self {
            notes: Mutex::new(Vec::new()),
            done: tokio::sync::Notify::new(),
        })
    }

    /// This recorder as a consumer handle.
    pub(crate) fn consumer(self: &Arc<Self>) -> ConsumerRef<T> {
        Arc::clone(self) as ConsumerRef<T>
    }

    pub(crate) fn notes(&self) -> Vec<Note<T>> {
        self.notes.lock().unwrap().clone()
    }

    /// Waits until a terminal notification has been recorded.
    pub(crate) async fn terminated(&self) {
        loop {
            let notified = self.done.notified();
            if self
                .notes()
                .iter()
                .any(|n| matches!(n, Note::Error(_) | Note::Completed))
            {
                return;
            }
            notified.await;
        }
    }

    fn push(&self, note: Note<T>) {
        self.notes.lock().unwrap().push(note);
    }
}

#[async_trait]
impl<T> Consumer<T> for Recorder<T>
where
    T: Clone + Send + 'static,
{
    async fn on_next(&self, value: T) {
        self.push(Note::Next(value));
    }

    async fn on_error(&self, error: SequenceError) {
        self.push(Note::Error(error));
        self.done.notify_waiters();
    }

    async fn on_completed(&self) {
        self.push(Note::Completed);
        self.done.notify_waiters();
    }
}
