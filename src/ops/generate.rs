//! # Generate: deterministic unfolding.
//!
//! [`Generate`] produces values from four caller-supplied pieces: an initial
//! state, a continuation condition, a state transition and a result projection.
//!
//! ```text
//! state = initial
//! while condition(&state):
//!     yield select(&state)
//!     state = iterate(state)        // runs on the *next* advance
//! ```
//!
//! ## Rules
//! - Steps are synchronous; `advance` never suspends.
//! - Cancellation is **not** checked between steps. Consumers that need to stop
//!   early simply stop advancing and release the cursor.
//! - A failing (or panicking) function is the terminal failure; no further
//!   transitions run after it.

use std::mem;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{BuildError, SequenceError};
use crate::guard;
use crate::sequence::{BoxCursor, Cursor, Sequence};

type Condition<S> = Box<dyn Fn(&S) -> Result<bool, SequenceError> + Send + Sync>;
type Iterate<S> = Box<dyn Fn(S) -> Result<S, SequenceError> + Send + Sync>;
type Select<S, R> = Box<dyn Fn(&S) -> Result<R, SequenceError> + Send + Sync>;

struct Plan<S, R> {
    initial: S,
    condition: Condition<S>,
    iterate: Iterate<S>,
    select: Select<S, R>,
}

/// Sequence unfolded from a state machine.
///
/// # Example
/// ```
/// use seqflow::{SequenceExt, generate};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let seq = generate(0, |x: &i32| *x < 5, |x| x + 1, |x: &i32| x * 10);
/// let out = seq.collect(CancellationToken::new()).await.unwrap();
/// assert_eq!(out, vec![0, 10, 20, 30, 40]);
/// # }
/// ```
pub struct Generate<S, R> {
    plan: Arc<Plan<S, R>>,
    catch_panics: bool,
}

/// Creates a [`Generate`] sequence from infallible functions.
pub fn generate<S, R, C, I, P>(initial: S, condition: C, iterate: I, select: P) -> Generate<S, R>
where
    C: Fn(&S) -> bool + Send + Sync + 'static,
    I: Fn(S) -> S + Send + Sync + 'static,
    P: Fn(&S) -> R + Send + Sync + 'static,
{
    try_generate(
        initial,
        move |s: &S| Ok(condition(s)),
        move |s| Ok(iterate(s)),
        move |s: &S| Ok(select(s)),
    )
}

/// Creates a [`Generate`] sequence from fallible functions.
///
/// An `Err` from any function becomes the consumption's terminal failure.
pub fn try_generate<S, R, C, I, P>(
    initial: S,
    condition: C,
    iterate: I,
    select: P,
) -> Generate<S, R>
where
    C: Fn(&S) -> Result<bool, SequenceError> + Send + Sync + 'static,
    I: Fn(S) -> Result<S, SequenceError> + Send + Sync + 'static,
    P: Fn(&S) -> Result<R, SequenceError> + Send + Sync + 'static,
{
    Generate {
        plan: Arc::new(Plan {
            initial,
            condition: Box::new(condition),
            iterate: Box::new(iterate),
            select: Box::new(select),
        }),
        catch_panics: Config::default().catch_panics,
    }
}

impl<S, R> Generate<S, R> {
    /// Creates a builder; `build()` rejects any missing piece.
    pub fn builder() -> GenerateBuilder<S, R> {
        GenerateBuilder::new()
    }

    /// Applies crate configuration (panic capture).
    pub fn with_config(mut self, cfg: &Config) -> Self {
        self.catch_panics = cfg.catch_panics;
        self
    }
}

/// Builder for [`Generate`] with argument validation.
///
/// # Example
/// ```
/// use seqflow::{BuildError, Generate, SequenceError};
///
/// let missing = Generate::<u32, u32>::builder()
///     .initial(1)
///     .condition(|s: &u32| Ok(*s < 3))
///     .build();
/// assert!(matches!(missing, Err(BuildError::Missing { arg: "iterate" })));
///
/// let ok = Generate::<u32, u32>::builder()
///     .initial(1)
///     .condition(|s: &u32| Ok(*s < 3))
///     .iterate(|s| Ok::<_, SequenceError>(s + 1))
///     .select(|s: &u32| Ok(*s))
///     .build();
/// assert!(ok.is_ok());
/// ```
pub struct GenerateBuilder<S, R> {
    initial: Option<S>,
    condition: Option<Condition<S>>,
    iterate: Option<Iterate<S>>,
    select: Option<Select<S, R>>,
    catch_panics: bool,
}

impl<S, R> GenerateBuilder<S, R> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            condition: None,
            iterate: None,
            select: None,
            catch_panics: Config::default().catch_panics,
        }
    }

    /// Sets the initial state.
    pub fn initial(mut self, initial: S) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Sets the continuation condition.
    pub fn condition<C>(mut self, condition: C) -> Self
    where
        C: Fn(&S) -> Result<bool, SequenceError> + Send + Sync + 'static,
    {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Sets the state transition.
    pub fn iterate<I>(mut self, iterate: I) -> Self
    where
        I: Fn(S) -> Result<S, SequenceError> + Send + Sync + 'static,
    {
        self.iterate = Some(Box::new(iterate));
        self
    }

    /// Sets the result projection.
    pub fn select<P>(mut self, select: P) -> Self
    where
        P: Fn(&S) -> Result<R, SequenceError> + Send + Sync + 'static,
    {
        self.select = Some(Box::new(select));
        self
    }

    /// Applies crate configuration (panic capture).
    pub fn with_config(mut self, cfg: &Config) -> Self {
        self.catch_panics = cfg.catch_panics;
        self
    }

    /// Validates the arguments and builds the sequence.
    pub fn build(self) -> Result<Generate<S, R>, BuildError> {
        let initial = self.initial.ok_or(BuildError::Missing { arg: "initial" })?;
        let condition = self.condition.ok_or(BuildError::Missing { arg: "condition" })?;
        let iterate = self.iterate.ok_or(BuildError::Missing { arg: "iterate" })?;
        let select = self.select.ok_or(BuildError::Missing { arg: "select" })?;
        Ok(Generate {
            plan: Arc::new(Plan {
                initial,
                condition,
                iterate,
                select,
            }),
            catch_panics: self.catch_panics,
        })
    }
}

impl<S, R> Default for GenerateBuilder<S, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, R> Sequence<R> for Generate<S, R>
where
    S: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    fn open(&self, _ctx: CancellationToken) -> BoxCursor<R> {
        Box::new(GenerateCursor {
            plan: Arc::clone(&self.plan),
            state: GenState::Fresh,
            catch_panics: self.catch_panics,
        })
    }
}

enum GenState<S> {
    Fresh,
    Yielded(S),
    Done,
}

struct GenerateCursor<S, R> {
    plan: Arc<Plan<S, R>>,
    state: GenState<S>,
    catch_panics: bool,
}

impl<S, R> GenerateCursor<S, R>
where
    S: Clone,
{
    /// One synchronous step. `state` is already `Done` while the functions run,
    /// so any early return leaves the cursor finished.
    fn step(&mut self) -> Result<Option<R>, SequenceError> {
        let plan = &self.plan;
        let current = match mem::replace(&mut self.state, GenState::Done) {
            GenState::Fresh => plan.initial.clone(),
            GenState::Yielded(prev) => guard::call(self.catch_panics, || (plan.iterate)(prev))?,
            GenState::Done => return Ok(None),
        };
        if !guard::call(self.catch_panics, || (plan.condition)(&current))? {
            return Ok(None);
        }
        let value = guard::call(self.catch_panics, || (plan.select)(&current))?;
        self.state = GenState::Yielded(current);
        Ok(Some(value))
    }
}

#[async_trait]
impl<S, R> Cursor<R> for GenerateCursor<S, R>
where
    S: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    async fn advance(&mut self) -> Result<Option<R>, SequenceError> {
        self.step()
    }

    async fn release(&mut self) {
        self.state = GenState::Done;
    }
}
