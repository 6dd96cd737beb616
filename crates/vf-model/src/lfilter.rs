//! Series L filter between a converter and the grid.

use crate::error::{ModelError, ModelResult};
use crate::state::{StateSpec, Sv};
use crate::subsystem::Subsystem;
use num_complex::Complex64;
use vf_core::{Real, complex_to_abc};

/// Inductive filter with series resistance.
///
/// State: converter-side current space vector `i_c` in stationary
/// coordinates:
///
/// ```text
/// L * di_c/dt = u_c - e_g - R * i_c
/// ```
///
/// The converter voltage `u_c` and the grid voltage `e_g` are coupling
/// inputs supplied by the owning model.
#[derive(Debug)]
pub struct LFilter {
    /// Filter inductance (H)
    l: Real,
    /// Series resistance (ohm)
    r: Real,
    // State
    i_c: Complex64,
    // Inputs
    u_c: Complex64,
    e_g: Complex64,
}

impl LFilter {
    /// Create an L filter.
    ///
    /// # Errors
    /// Fails if the inductance is not positive or the resistance is negative.
    pub fn new(l: Real, r: Real) -> ModelResult<Self> {
        if !(l.is_finite() && l > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "filter inductance must be positive",
            });
        }
        if !(r.is_finite() && r >= 0.0) {
            return Err(ModelError::InvalidArg {
                what: "filter resistance cannot be negative",
            });
        }
        Ok(Self {
            l,
            r,
            i_c: Complex64::ZERO,
            u_c: Complex64::ZERO,
            e_g: Complex64::ZERO,
        })
    }

    /// Set the coupling inputs: converter voltage and grid voltage.
    pub fn set_inputs(&mut self, u_c: Complex64, e_g: Complex64) {
        self.u_c = u_c;
        self.e_g = e_g;
    }

    /// Converter-side current state.
    pub fn current(&self) -> Complex64 {
        self.i_c
    }

    /// Measured phase currents.
    pub fn meas_phase_currents(&self) -> [Real; 3] {
        complex_to_abc(self.i_c)
    }
}

impl Subsystem for LFilter {
    fn name(&self) -> &'static str {
        "lfilter"
    }

    fn state_spec(&self) -> Vec<StateSpec> {
        vec![StateSpec::complex("i_c")]
    }

    fn state(&self) -> Vec<Sv> {
        vec![Sv::Complex(self.i_c)]
    }

    fn set_state(&mut self, values: &[Sv]) -> ModelResult<()> {
        match values {
            [i_c] => {
                self.i_c = i_c.expect_complex()?;
                Ok(())
            }
            _ => Err(ModelError::Invariant {
                what: "lfilter: expected one state value",
            }),
        }
    }

    fn set_outputs(&mut self, _t: Real) -> ModelResult<()> {
        // The current is a state; nothing algebraic to cache.
        Ok(())
    }

    fn rhs(&self, _t: Real) -> ModelResult<Vec<Sv>> {
        let di_c = (self.u_c - self.e_g - self.r * self.i_c) / self.l;
        if !(di_c.re.is_finite() && di_c.im.is_finite()) {
            return Err(ModelError::NonFinite {
                what: "lfilter current derivative",
                value: di_c.norm_sqr(),
            });
        }
        Ok(vec![Sv::Complex(di_c)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_parameters() {
        assert!(LFilter::new(0.0, 0.1).is_err());
        assert!(LFilter::new(0.01, -0.1).is_err());
    }

    #[test]
    fn voltage_difference_drives_current() {
        let mut f = LFilter::new(0.01, 0.0).unwrap();
        f.set_inputs(Complex64::new(10.0, 0.0), Complex64::new(4.0, 0.0));
        f.set_outputs(0.0).unwrap();
        let d = f.rhs(0.0).unwrap();
        let di = d[0].expect_complex().unwrap();
        assert!((di.re - 600.0).abs() < 1e-9);
    }

    #[test]
    fn resistance_opposes_current() {
        let mut f = LFilter::new(0.01, 0.5).unwrap();
        f.set_state(&[Sv::Complex(Complex64::new(2.0, 0.0))]).unwrap();
        f.set_inputs(Complex64::ZERO, Complex64::ZERO);
        f.set_outputs(0.0).unwrap();
        let di = f.rhs(0.0).unwrap()[0].expect_complex().unwrap();
        assert!((di.re + 100.0).abs() < 1e-9);
    }
}
