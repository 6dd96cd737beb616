//! Stiff three-phase grid voltage source.

use crate::error::{ModelError, ModelResult};
use crate::state::{StateSpec, Sv};
use crate::subsystem::Subsystem;
use num_complex::Complex64;
use vf_core::{Real, exp_j};

/// Ideal grid voltage source with constant amplitude and frequency.
///
/// State: grid angle `theta_g` (rad), `d theta_g / dt = w_g`. The output
/// voltage space vector is `e_g = e_g_amp * exp(j * theta_g)`. Integrating
/// the angle (rather than computing `w_g * t`) keeps the source well defined
/// if the frequency is later made time varying.
#[derive(Debug)]
pub struct GridSource {
    /// Phase voltage amplitude (V, peak)
    e_g_amp: Real,
    /// Angular frequency (rad/s)
    w_g: Real,
    // State
    theta_g: Real,
    // Cached output
    e_g: Complex64,
}

impl GridSource {
    /// Create a grid source with peak phase voltage `e_g_amp` and angular
    /// frequency `w_g`.
    ///
    /// # Errors
    /// Fails if the amplitude is negative or either value is non-finite.
    pub fn new(e_g_amp: Real, w_g: Real) -> ModelResult<Self> {
        if !(e_g_amp.is_finite() && e_g_amp >= 0.0) {
            return Err(ModelError::InvalidArg {
                what: "grid voltage amplitude cannot be negative",
            });
        }
        if !w_g.is_finite() {
            return Err(ModelError::InvalidArg {
                what: "grid frequency must be finite",
            });
        }
        Ok(Self {
            e_g_amp,
            w_g,
            theta_g: 0.0,
            e_g: Complex64::new(e_g_amp, 0.0),
        })
    }

    /// Cached grid voltage space vector.
    pub fn voltage(&self) -> Complex64 {
        self.e_g
    }
}

impl Subsystem for GridSource {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn state_spec(&self) -> Vec<StateSpec> {
        vec![StateSpec::real("theta_g")]
    }

    fn state(&self) -> Vec<Sv> {
        vec![Sv::Real(self.theta_g)]
    }

    fn set_state(&mut self, values: &[Sv]) -> ModelResult<()> {
        match values {
            [theta_g] => {
                self.theta_g = theta_g.expect_real()?;
                Ok(())
            }
            _ => Err(ModelError::Invariant {
                what: "grid: expected one state value",
            }),
        }
    }

    fn set_outputs(&mut self, _t: Real) -> ModelResult<()> {
        self.e_g = self.e_g_amp * exp_j(self.theta_g);
        Ok(())
    }

    fn rhs(&self, _t: Real) -> ModelResult<Vec<Sv>> {
        Ok(vec![Sv::Real(self.w_g)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_parameters() {
        assert!(GridSource::new(-1.0, 100.0).is_err());
        assert!(GridSource::new(Real::NAN, 100.0).is_err());
        assert!(GridSource::new(325.0, Real::INFINITY).is_err());
    }

    #[test]
    fn voltage_rotates_with_angle() {
        let mut g = GridSource::new(325.0, 2.0 * std::f64::consts::PI * 50.0).unwrap();
        g.set_state(&[Sv::Real(std::f64::consts::FRAC_PI_2)]).unwrap();
        g.set_outputs(0.0).unwrap();
        let e = g.voltage();
        assert!(e.re.abs() < 1e-9);
        assert!((e.im - 325.0).abs() < 1e-9);
    }

    #[test]
    fn angle_advances_at_grid_frequency() {
        let g = GridSource::new(325.0, 314.159).unwrap();
        let d = g.rhs(0.0).unwrap();
        assert!((d[0].expect_real().unwrap() - 314.159).abs() < 1e-12);
    }

    #[test]
    fn zero_amplitude_is_a_short() {
        let mut g = GridSource::new(0.0, 314.159).unwrap();
        g.set_outputs(0.0).unwrap();
        assert!(g.voltage().norm() < 1e-15);
    }
}
