//! Error types for the simulation engine.

use thiserror::Error;
use vf_core::Real;
use vf_model::ModelError;

/// Errors encountered while driving a hybrid simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-finite state at t = {t}: {what}")]
    NonFiniteState { t: Real, what: &'static str },

    #[error("Integrator step size collapsed at t = {t} (h = {h})")]
    StepSizeCollapse { t: Real, h: Real },

    #[error("Model error at t = {t}: {source}")]
    Model {
        t: Real,
        #[source]
        source: ModelError,
    },

    #[error("Controller error: {what}")]
    Control { what: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}

impl SimError {
    /// Attach the simulation time at which a model error surfaced.
    pub fn model(t: Real, source: ModelError) -> Self {
        SimError::Model { t, source }
    }
}

pub type SimResult<T> = Result<T, SimError>;
