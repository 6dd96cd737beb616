//! Error types for controller construction and execution.

use thiserror::Error;
use vf_sim::SimError;

/// Result type for controller operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors raised by controllers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a controller constructor.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Controller produced an unusable command.
    #[error("Controller state error: {what}")]
    StateError { what: String },
}

impl From<ControlError> for SimError {
    fn from(e: ControlError) -> Self {
        SimError::Control {
            what: e.to_string(),
        }
    }
}
