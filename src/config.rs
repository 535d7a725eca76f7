//! # Crate-wide configuration.
//!
//! Provides [`Config`], centralized knobs read by the combinators.
//!
//! Config is used by passing it to a combinator's `with_config`:
//! - [`Expand::with_config`](crate::Expand::with_config)
//! - [`Defer::with_config`](crate::Defer::with_config)
//! - [`Generate::with_config`](crate::Generate::with_config)
//!
//! Combinators built without it behave as with `Config::default()`.
//!
//! ## Sentinel values
//! - `expand_queue_warn = 0` → never warn about expansion queue growth

/// Configuration shared by the sequence combinators.
///
/// ## Field semantics
/// - `expand_queue_warn`: pending-sequence count above which an expansion logs a warning (`0` = off)
/// - `catch_panics`: convert panics in user callbacks into [`SequenceError::Panicked`](crate::SequenceError::Panicked)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over checking sentinels inline.
#[derive(Clone, Debug)]
pub struct Config {
    /// Warn once per consumption when an expansion queue holds more than this
    /// many pending sequences.
    ///
    /// This is an observability threshold only; the queue is never bounded.
    pub expand_queue_warn: usize,

    /// Whether panics raised by user callbacks (factories, selectors,
    /// generation functions, producer attachment) become terminal failures.
    ///
    /// When `false` the panic unwinds through the consumer's `advance` call.
    /// Consumer notification handlers are never guarded either way.
    pub catch_panics: bool,
}

impl Config {
    /// Returns the expansion warning threshold as an `Option`.
    ///
    /// - `None` → never warn
    /// - `Some(n)` → warn when more than `n` sequences are pending
    #[inline]
    pub fn expand_queue_warn_limit(&self) -> Option<usize> {
        if self.expand_queue_warn == 0 {
            None
        } else {
            Some(self.expand_queue_warn)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `expand_queue_warn = 1024`
    /// - `catch_panics = true`
    fn default() -> Self {
        Self {
            expand_queue_warn: 1024,
            catch_panics: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.expand_queue_warn_limit(), Some(1024));
        assert!(cfg.catch_panics);
    }

    #[test]
    fn test_zero_disables_queue_warning() {
        let cfg = Config {
            expand_queue_warn: 0,
            ..Config::default()
        };
        assert_eq!(cfg.expand_queue_warn_limit(), None);
    }
}
