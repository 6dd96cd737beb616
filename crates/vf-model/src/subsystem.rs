//! Subsystem trait for heterogeneous continuous-time physical models.

use crate::error::ModelResult;
use crate::state::{StateSpec, Sv};
use vf_core::Real;

/// A continuous-time physical subsystem owning a slice of the model state.
///
/// A subsystem declares its state layout once, exchanges state values with the
/// codec, and exposes its dynamics through `set_outputs` and `rhs`. Coupling
/// signals from peer subsystems are fed in through typed setters on the
/// concrete struct; the owning model calls those in a fixed wiring order
/// before `set_outputs`.
///
/// Call protocol per derivative evaluation:
/// 1. `set_state` with the unpacked values for this subsystem
/// 2. typed input setters (model wiring)
/// 3. `set_outputs(t)` — computes and caches algebraic outputs, must not
///    mutate state
/// 4. `rhs(t)` — state derivative in declaration order, using only the cached
///    outputs; calling it before `set_outputs` for the same `t` is a wiring
///    bug when cross-subsystem coupling exists
///
/// Measurement accessors (`meas_*` methods on the concrete types) are pure
/// functions of the current state and may be called at any time between
/// integration intervals.
pub trait Subsystem {
    /// Short stable name, used in error messages and log column names.
    fn name(&self) -> &'static str;

    /// Ordered state layout. Must not change over the subsystem's lifetime.
    fn state_spec(&self) -> Vec<StateSpec>;

    /// Current state values in declaration order.
    fn state(&self) -> Vec<Sv>;

    /// Overwrite the state with unpacked values in declaration order.
    fn set_state(&mut self, values: &[Sv]) -> ModelResult<()>;

    /// Compute and cache this subsystem's algebraic outputs for time `t`.
    fn set_outputs(&mut self, t: Real) -> ModelResult<()>;

    /// State derivative in declaration order.
    fn rhs(&self, t: Real) -> ModelResult<Vec<Sv>>;
}
