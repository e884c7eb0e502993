use core::fmt;

/// Failure modes of the big number, Montgomery and RSA layers.
///
/// All checks that can fail are done before caller-visible output is written.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// Contexts of the wrong shape or kind were combined in one operation.
    ContextMismatch,
    /// Invalid argument: negative operand, zero or invalid length, even exponent where odd is required.
    BadArgument,
    /// Even (or zero) modulus handed to a Montgomery engine.
    BadModulus,
    /// Operand not smaller than the modulus, or negative where positive is required.
    OutOfRange,
    /// Destination or scratch buffer too small.
    SizeError,
    /// Key allocated, but never set.
    IncompleteContext,
    /// A bounded search (prime candidates, witnesses) ran out of rounds.
    InsufficientEntropy,
    /// The random number generator failed.
    InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::ContextMismatch => "context mismatch",
            Error::BadArgument => "bad argument",
            Error::BadModulus => "bad modulus",
            Error::OutOfRange => "argument out of range",
            Error::SizeError => "buffer too small",
            Error::IncompleteContext => "key context was never set",
            Error::InsufficientEntropy => "insufficient entropy",
            Error::InternalError => "random number generator failed",
        })
    }
}

impl From<rand_core::Error> for Error {
    fn from(_: rand_core::Error) -> Self {
        Error::InternalError
    }
}

/// [`Error`] or success.
pub type Result<T> = core::result::Result<T, Error>;
