//! Runtime error types.
//!
//! Runtime constraints (invalid yield directives, invalid native-function
//! arguments) raise an error that unwinds the offending frame's fiber;
//! there is no user-level exception mechanism.

use thiserror::Error;

/// An error raised while a frame is running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A yield directive named an operation outside `{1, 2, 4}`.
    #[error("Invalid yield op {0}")]
    InvalidYieldOp(i32),

    /// A yield directive's payload was not the expected number.
    #[error("Yielded invalid type")]
    InvalidYieldValue,

    /// A native function received an argument of the wrong shape.
    #[error("Invalid argument for parameter {0}, expect a function")]
    ExpectedFunction(usize),

    /// A fault raised by user code through a coroutine.
    #[error("{0}")]
    Fault(String),
}
