use thiserror::Error;

/// Error taxonomy for the decision engine.
///
/// Mirrors the three-way split described for this library: malformed input is
/// always recoverable, an unsupported combination of options is reported
/// rather than guessed at, and an invariant violation indicates a bug in this
/// crate rather than in the caller's automata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LibError {
    /// Malformed input: bad Timbuk syntax, an undeclared symbol, an arity
    /// mismatch between a transition and its symbol's declared arity, or a
    /// state referenced in a transition/final-state set that was never
    /// declared.
    #[error("input error: {0}")]
    InputError(String),

    /// The caller asked for a combination of options this library does not
    /// support (e.g. congruence-based inclusion on a tree automaton).
    #[error("unimplemented: {0}")]
    NotImplemented(String),

    /// An internal invariant failed. This is always a bug in this crate; it
    /// is returned rather than panicking so that embedding applications can
    /// decide how to fail, but it is never expected to occur and must never
    /// be matched on for control flow.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, LibError>;

/// Builds an [`LibError::InvariantViolation`] with a formatted message.
///
/// Named like an assertion macro because that's the role it plays: every
/// call site is asserting something the rest of the module relies on.
macro_rules! invariant {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::errors::LibError::InvariantViolation(format!($($arg)*)));
        }
    };
}

pub(crate) use invariant;
