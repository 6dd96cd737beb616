//! Discrete-time controller interface.

use crate::error::SimResult;
use serde::{Deserialize, Serialize};
use vf_core::Real;
use vf_model::Plant;

/// One controller execution's output: the sampling period to hold until the
/// next execution and the three-phase duty ratios commanded for it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ControlOutput {
    /// Sampling period until the next controller call (seconds, positive).
    pub t_s: Real,
    /// Commanded duty ratios in `[0, 1]`.
    pub d_abc: [Real; 3],
}

/// A sampled-data controller driving a plant `P`.
///
/// The driver calls the methods in a fixed order once per sampling instant:
/// `measure` reads sensors from the committed plant state, `feedback`
/// derives the feedback signals, `output` computes the actuation command,
/// and `update` advances the controller's internal states. Keeping the
/// phases separate keeps `measure` and `feedback` pure, so logging a
/// controller never perturbs it.
pub trait Controller<P: Plant> {
    /// Raw sensor readings taken from the plant.
    type Meas;
    /// Feedback signals derived from the measurements.
    type Fbk;

    /// Sample the plant's sensors. Must not mutate the plant.
    fn measure(&self, plant: &P) -> Self::Meas;

    /// Derive feedback signals from a measurement.
    fn feedback(&self, meas: &Self::Meas) -> Self::Fbk;

    /// Compute the actuation command for the interval starting at `t`.
    ///
    /// # Errors
    /// Controllers fail here when references or gains produce an unusable
    /// command, e.g. a non-positive sampling period.
    fn output(&self, t: Real, fbk: &Self::Fbk) -> SimResult<ControlOutput>;

    /// Advance internal controller states after the command is issued.
    fn update(&mut self, fbk: &Self::Fbk, out: &ControlOutput);

    /// Named internal signals to record at each sampling instant.
    ///
    /// The default records nothing; controllers override this to expose
    /// references and intermediate quantities to the discrete log.
    fn telemetry(&self, _fbk: &Self::Fbk) -> Vec<(&'static str, Real)> {
        Vec::new()
    }
}
