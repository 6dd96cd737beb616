//! Single-subsystem model, mostly for tests and bring-up.

use crate::error::ModelResult;
use crate::plant::Plant;
use crate::state::StateCodec;
use crate::subsystem::Subsystem;
use nalgebra::DVector;
use vf_core::Real;

/// Wraps one subsystem as a complete plant. The actuation input is ignored;
/// the subsystem's own inputs stay as configured.
#[derive(Debug)]
pub struct SingleSubsystem<S: Subsystem> {
    subsystem: S,
    codec: StateCodec,
}

impl<S: Subsystem> SingleSubsystem<S> {
    pub fn new(subsystem: S) -> Self {
        let codec = StateCodec::new(&[(subsystem.name(), subsystem.state_spec())]);
        Self { subsystem, codec }
    }

    pub fn inner(&self) -> &S {
        &self.subsystem
    }
}

impl<S: Subsystem> Plant for SingleSubsystem<S> {
    fn codec(&self) -> &StateCodec {
        &self.codec
    }

    fn flat_state(&self) -> ModelResult<DVector<Real>> {
        self.codec.pack(&[self.subsystem.state()])
    }

    fn commit_state(&mut self, x: &DVector<Real>) -> ModelResult<()> {
        let vals = self.codec.unpack(x)?;
        self.subsystem.set_state(&vals[0])
    }

    fn evaluate(&mut self, t: Real, x: &DVector<Real>) -> ModelResult<DVector<Real>> {
        let vals = self.codec.unpack(x)?;
        self.subsystem.set_state(&vals[0])?;
        self.subsystem.set_outputs(t)?;
        self.codec.pack(&[self.subsystem.rhs(t)?])
    }

    fn set_actuation(&mut self, _q: [Real; 3]) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanics::Mechanics;
    use crate::state::Sv;

    #[test]
    fn wraps_mechanics_as_plant() {
        let mut mech = Mechanics::new(1.0, 0.0)
            .unwrap()
            .with_load_torque(Box::new(|_| -1.0));
        mech.set_state(&[Sv::Real(0.0), Sv::Real(0.0)]).unwrap();
        let mut plant = SingleSubsystem::new(mech);
        let x = plant.flat_state().unwrap();
        assert_eq!(x.len(), 2);
        let dx = plant.evaluate(0.0, &x).unwrap();
        // dw = -tau_l / j = 1
        assert!((dx[0] - 1.0).abs() < 1e-12);
    }
}
