//! Error taxonomy for the range query engine.

use thiserror::Error;

/// Everything that can go wrong while parsing or evaluating a range
/// expression. Every variant here is fatal to the query in progress;
/// non-error outcomes (result-cap reached, missing cluster/key) are
/// represented in-band by the evaluator, not as errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("could not parse query at position {position}: {message}")]
    Parse { message: String, position: usize },

    #[error("query exceeded maximum recursion depth")]
    DepthExceeded,

    #[error("value would exceed max query size: {value}")]
    ValueTooLarge { value: String },

    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("wrong number of params for {name}: expected {expected}, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid regex /{pattern}/: {message}")]
    RegexCompile { pattern: String, message: String },
}
