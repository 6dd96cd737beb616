//! Voltage-source converter with a stiff DC link.

use crate::error::{ModelError, ModelResult};
use crate::state::{StateSpec, Sv};
use crate::subsystem::Subsystem;
use num_complex::Complex64;
use vf_core::{Real, abc_to_complex};

/// Three-phase two-level voltage-source converter.
///
/// The DC-bus voltage is constant (stiff DC link), so the converter carries no
/// continuous state. The actuation input is the three-phase vector applied by
/// the driver: binary switching states under carrier comparison, duty ratios
/// under zero-order hold. The AC-side output voltage space vector is
/// `u_cs = u_dc * abc_to_complex(q)`.
#[derive(Debug)]
pub struct VoltageSourceConverter {
    u_dc: Real,
    q: [Real; 3],
    u_cs: Complex64,
}

impl VoltageSourceConverter {
    /// Create a converter with the given DC-bus voltage.
    ///
    /// # Errors
    /// Fails if `u_dc` is not positive and finite.
    pub fn new(u_dc: Real) -> ModelResult<Self> {
        if !u_dc.is_finite() || u_dc <= 0.0 {
            return Err(ModelError::InvalidArg {
                what: "dc-bus voltage must be positive",
            });
        }
        Ok(Self {
            u_dc,
            q: [0.0; 3],
            u_cs: Complex64::ZERO,
        })
    }

    /// Apply the actuation vector for the next integration interval.
    pub fn set_switching_state(&mut self, q: [Real; 3]) {
        self.q = q;
    }

    /// Cached AC-side voltage space vector.
    pub fn voltage(&self) -> Complex64 {
        self.u_cs
    }

    /// Measured DC-bus voltage.
    pub fn meas_dc_voltage(&self) -> Real {
        self.u_dc
    }
}

impl Subsystem for VoltageSourceConverter {
    fn name(&self) -> &'static str {
        "converter"
    }

    fn state_spec(&self) -> Vec<StateSpec> {
        Vec::new()
    }

    fn state(&self) -> Vec<Sv> {
        Vec::new()
    }

    fn set_state(&mut self, values: &[Sv]) -> ModelResult<()> {
        if !values.is_empty() {
            return Err(ModelError::Invariant {
                what: "converter: unexpected state values",
            });
        }
        Ok(())
    }

    fn set_outputs(&mut self, _t: Real) -> ModelResult<()> {
        self.u_cs = self.u_dc * abc_to_complex(self.q);
        Ok(())
    }

    fn rhs(&self, _t: Real) -> ModelResult<Vec<Sv>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nonpositive_dc_voltage() {
        assert!(VoltageSourceConverter::new(0.0).is_err());
        assert!(VoltageSourceConverter::new(-540.0).is_err());
        assert!(VoltageSourceConverter::new(Real::NAN).is_err());
    }

    #[test]
    fn symmetric_duty_gives_zero_voltage() {
        let mut conv = VoltageSourceConverter::new(540.0).unwrap();
        conv.set_switching_state([0.5, 0.5, 0.5]);
        conv.set_outputs(0.0).unwrap();
        assert!(conv.voltage().norm() < 1e-12);
    }

    #[test]
    fn phase_a_switching_state_voltage() {
        let mut conv = VoltageSourceConverter::new(540.0).unwrap();
        conv.set_switching_state([1.0, 0.0, 0.0]);
        conv.set_outputs(0.0).unwrap();
        let u = conv.voltage();
        // (2/3) * u_dc along phase a
        assert!((u.re - 360.0).abs() < 1e-9);
        assert!(u.im.abs() < 1e-9);
    }

    #[test]
    fn stateless() {
        let conv = VoltageSourceConverter::new(540.0).unwrap();
        assert!(conv.state_spec().is_empty());
        assert!(conv.state().is_empty());
    }
}
