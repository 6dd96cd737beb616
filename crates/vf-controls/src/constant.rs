//! Open-loop constant-duty controller.

use crate::error::{ControlError, ControlResult};
use std::marker::PhantomData;
use vf_core::Real;
use vf_model::Plant;
use vf_sim::{ControlOutput, Controller, SimResult};

/// Issues a fixed duty-ratio command at a fixed rate, ignoring measurements.
///
/// Useful for open-loop experiments: applying a known voltage to a plant and
/// inspecting the response without any feedback in the loop.
#[derive(Clone, Debug)]
pub struct ConstantDutyController<P> {
    t_s: Real,
    d_abc: [Real; 3],
    _plant: PhantomData<fn(&P)>,
}

impl<P> ConstantDutyController<P> {
    /// # Errors
    /// Fails on a non-positive sampling period or a duty ratio outside
    /// `[0, 1]`.
    pub fn new(t_s: Real, d_abc: [Real; 3]) -> ControlResult<Self> {
        if !(t_s.is_finite() && t_s > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sampling period must be positive",
            });
        }
        for d in d_abc {
            if !(d.is_finite() && (0.0..=1.0).contains(&d)) {
                return Err(ControlError::InvalidArg {
                    what: "duty ratio outside [0, 1]",
                });
            }
        }
        Ok(Self {
            t_s,
            d_abc,
            _plant: PhantomData,
        })
    }
}

impl<P: Plant> Controller<P> for ConstantDutyController<P> {
    type Meas = ();
    type Fbk = ();

    fn measure(&self, _plant: &P) {}

    fn feedback(&self, _meas: &()) {}

    fn output(&self, _t: Real, _fbk: &()) -> SimResult<ControlOutput> {
        Ok(ControlOutput {
            t_s: self.t_s,
            d_abc: self.d_abc,
        })
    }

    fn update(&mut self, _fbk: &(), _out: &ControlOutput) {}
}
