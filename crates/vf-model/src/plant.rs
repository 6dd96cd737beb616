//! Plant trait: the contract between a composed model and the simulation
//! driver.

use crate::error::ModelResult;
use crate::state::StateCodec;
use nalgebra::DVector;
use vf_core::Real;

/// A fixed composition of subsystems forming one integrable system.
///
/// The driver owns the flat state vector for the duration of an integration
/// step; the plant only sees it as an argument to `evaluate` and gets the
/// accepted value written back through `commit_state`. `evaluate` must be a
/// pure function of `(t, x)` for a fixed actuation: the integrator calls it a
/// solver-determined number of times per step, including for rejected steps.
pub trait Plant {
    /// The codec describing the flat state layout.
    fn codec(&self) -> &StateCodec;

    /// Pack the subsystems' current state into a flat vector.
    fn flat_state(&self) -> ModelResult<DVector<Real>>;

    /// Write an accepted integrator state back into the subsystems.
    fn commit_state(&mut self, x: &DVector<Real>) -> ModelResult<()>;

    /// Aggregate state derivative: unpack `x`, resolve subsystem outputs in
    /// the model's fixed wiring order, evaluate each subsystem's `rhs`, and
    /// repack the derivatives in the same flat layout.
    fn evaluate(&mut self, t: Real, x: &DVector<Real>) -> ModelResult<DVector<Real>>;

    /// Apply the actuation vector for the next integration interval. Only
    /// called between intervals, never during integration.
    fn set_actuation(&mut self, q: [Real; 3]);
}
