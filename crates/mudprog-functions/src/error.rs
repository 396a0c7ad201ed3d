//! Errors raised by built-in functions at runtime.

use mudprog_foundation::ConcreteKind;
use thiserror::Error;

/// Failure inside a built-in function or collection extension.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    /// A null value reached a parameter that needs a payload.
    #[error("{function}: argument {position} is null")]
    NullArgument {
        /// Function name
        function: &'static str,
        /// Zero-based argument position
        position: usize,
    },

    /// Argument payload did not have the shape the signature promised.
    #[error("{function}: argument {position} has the wrong shape")]
    ArgumentShape {
        /// Function name
        function: &'static str,
        /// Zero-based argument position
        position: usize,
    },

    /// Argument was well-typed but outside the function's domain.
    #[error("{function}: {message}")]
    InvalidArgument {
        /// Function name
        function: &'static str,
        /// What was wrong
        message: String,
    },

    /// Arithmetic produced no usable number.
    #[error("numeric error in {function}: {message}")]
    Numeric {
        /// Function or operator name
        function: &'static str,
        /// What went wrong
        message: String,
    },

    /// The world registry had no entity for the key.
    #[error("no {kind} matches '{key}'")]
    LookupMiss {
        /// Kind that was searched
        kind: ConcreteKind,
        /// Key that missed
        key: String,
    },

    /// A collection index was outside the collection.
    #[error("index {index} is out of range for a collection of {len}")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
        /// Collection length
        len: usize,
    },

    /// A collection grew past the configured limit.
    #[error("collection of {len} elements exceeds the limit of {limit}")]
    CollectionTooLarge {
        /// Resulting length
        len: usize,
        /// Configured limit
        limit: usize,
    },
}
