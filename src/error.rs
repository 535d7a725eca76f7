//! Error types used by sequences, combinators and producers.
//!
//! This module defines two error enums:
//!
//! - [`SequenceError`]: the terminal failure of one consumption or attachment.
//! - [`BuildError`]: argument validation raised while constructing a combinator.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.

use std::fmt::Display;

use thiserror::Error;

/// # Terminal failure of a consumption attempt.
///
/// Every failure travels as exactly one `Err(SequenceError)` from
/// [`Cursor::advance`](crate::Cursor::advance) or one
/// [`Consumer::on_error`](crate::Consumer::on_error) call. Combinators forward
/// failures unchanged, so the variant tells where the failure was first raised.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// A source sequence failed while producing a value.
    #[error("source failed: {error}")]
    Source {
        /// The underlying error message.
        error: String,
    },

    /// A deferred factory failed to build its sequence.
    #[error("factory failed: {error}")]
    Factory {
        /// The underlying error message.
        error: String,
    },

    /// An expansion selector failed for a produced value.
    #[error("selector failed: {error}")]
    Selector {
        /// The underlying error message.
        error: String,
    },

    /// A generation function (condition, iterate or projection) failed.
    #[error("generator failed: {error}")]
    Generator {
        /// The underlying error message.
        error: String,
    },

    /// A producer failed while attaching a consumer.
    #[error("subscribe failed: {error}")]
    Subscribe {
        /// The underlying error message.
        error: String,
    },

    /// A user callback panicked; the panic payload was captured.
    #[error("callback panicked: {error}")]
    Panicked {
        /// Panic payload rendered as text.
        error: String,
    },
}

impl SequenceError {
    /// Shorthand for [`SequenceError::Source`].
    ///
    /// # Example
    /// ```
    /// use seqflow::SequenceError;
    ///
    /// let err = SequenceError::source("disk gone");
    /// assert_eq!(err.to_string(), "source failed: disk gone");
    /// ```
    pub fn source(error: impl Display) -> Self {
        SequenceError::Source {
            error: error.to_string(),
        }
    }

    /// Shorthand for [`SequenceError::Factory`].
    pub fn factory(error: impl Display) -> Self {
        SequenceError::Factory {
            error: error.to_string(),
        }
    }

    /// Shorthand for [`SequenceError::Selector`].
    pub fn selector(error: impl Display) -> Self {
        SequenceError::Selector {
            error: error.to_string(),
        }
    }

    /// Shorthand for [`SequenceError::Generator`].
    pub fn generator(error: impl Display) -> Self {
        SequenceError::Generator {
            error: error.to_string(),
        }
    }

    /// Shorthand for [`SequenceError::Subscribe`].
    pub fn subscribe(error: impl Display) -> Self {
        SequenceError::Subscribe {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use seqflow::SequenceError;
    ///
    /// let err = SequenceError::selector("bad node");
    /// assert_eq!(err.as_label(), "sequence_selector");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SequenceError::Source { .. } => "sequence_source",
            SequenceError::Factory { .. } => "sequence_factory",
            SequenceError::Selector { .. } => "sequence_selector",
            SequenceError::Generator { .. } => "sequence_generator",
            SequenceError::Subscribe { .. } => "sequence_subscribe",
            SequenceError::Panicked { .. } => "sequence_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SequenceError::Source { error } => format!("source: {error}"),
            SequenceError::Factory { error } => format!("factory: {error}"),
            SequenceError::Selector { error } => format!("selector: {error}"),
            SequenceError::Generator { error } => format!("generator: {error}"),
            SequenceError::Subscribe { error } => format!("subscribe: {error}"),
            SequenceError::Panicked { error } => format!("panicked: {error}"),
        }
    }

    /// Indicates whether the failure came from a captured panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, SequenceError::Panicked { .. })
    }
}

/// # Errors raised while constructing a combinator.
///
/// Raised synchronously at construction time, before any consumption begins.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A required argument was never supplied.
    #[error("missing required argument `{arg}`")]
    Missing {
        /// Name of the absent argument.
        arg: &'static str,
    },
}

impl BuildError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use seqflow::BuildError;
    ///
    /// let err = BuildError::Missing { arg: "condition" };
    /// assert_eq!(err.as_label(), "build_missing_argument");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BuildError::Missing { .. } => "build_missing_argument",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BuildError::Missing { arg } => format!("missing: {arg}"),
        }
    }
}
