//! Result codes returned by platform-adapter operations

use thiserror::Error;

/// Errors a platform adapter can report to the layer above it
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaError {
    /// The operation is not possible in the current state
    #[error("operation not possible in current state")]
    NotPossible,

    /// A parameter was rejected (wrong code, malformed value)
    #[error("bad parameter")]
    BadParameter,

    /// Generic failure, also used for unsupported operations
    #[error("fault")]
    Fault,

    /// A value did not fit its destination
    #[error("value too long: {len} > {max}")]
    Overflow { len: usize, max: usize },

    /// The requested item has never been set
    #[error("not found: {0}")]
    NotFound(String),

    /// A simulator expectation was violated by the caller
    #[error("unexpected call: {0}")]
    UnexpectedCall(String),
}

/// Convenience alias used throughout the adapter traits
pub type PaResult<T> = Result<T, PaError>;

/// Check that `value` is at most `max` bytes long
pub fn check_len(value: &str, max: usize) -> PaResult<()> {
    if value.len() > max {
        Err(PaError::Overflow {
            len: value.len(),
            max,
        })
    } else {
        Ok(())
    }
}
