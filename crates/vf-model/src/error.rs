//! Error types for model construction and evaluation.

use thiserror::Error;
use vf_core::CoreError;

/// Errors encountered while building or evaluating a plant model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<CoreError> for ModelError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NonFinite { what, value } => ModelError::NonFinite { what, value },
            CoreError::InvalidArg { what } => ModelError::InvalidArg { what },
            CoreError::Invariant { what } => ModelError::Invariant { what },
        }
    }
}
