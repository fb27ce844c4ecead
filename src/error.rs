//! Crate-wide error type.
//!
//! Every public operation validates its inputs before allocating output and
//! reports precondition failures synchronously; there are no partial results.

/// Reasons why a pipeline operation may refuse to run.
#[derive(Clone, Debug, PartialEq)]
pub enum SuperpixelError {
    /// Two inputs that must share a shape disagree.
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// A parameter is outside its documented valid range.
    InvalidConfig {
        param: &'static str,
        reason: &'static str,
    },
    /// The grid has zero pixels.
    EmptyInput,
}

impl std::fmt::Display for SuperpixelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuperpixelError::DimensionMismatch {
                what,
                expected,
                found,
            } => write!(
                f,
                "dimension mismatch for {what}: expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            SuperpixelError::InvalidConfig { param, reason } => {
                write!(f, "invalid configuration: {param} {reason}")
            }
            SuperpixelError::EmptyInput => write!(f, "zero-sized input grid"),
        }
    }
}

impl std::error::Error for SuperpixelError {}
