// Error types for the policy engine.
//
// Decisions themselves never fail: missing configuration and unknown
// severity strings degrade to "no action". These errors only surface while
// parsing request arguments into closed types, or when composing rules that
// disagree about a bound parameter.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Two rules bound the same parameter name to different values.
    #[error("parameter `{name}` is bound by more than one rule with different values")]
    ParameterConflict { name: String },

    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    #[error("unknown filtering strategy: {0}")]
    UnknownStrategy(String),

    #[error("unknown replacement pattern: {0}")]
    UnknownPattern(String),

    #[error("unknown visibility status: {0}")]
    UnknownVisibilityStatus(String),
}
