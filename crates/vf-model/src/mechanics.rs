//! Rotational mechanics with an injected load-torque profile.

use crate::error::{ModelError, ModelResult};
use crate::state::{StateSpec, Sv};
use crate::subsystem::Subsystem;
use vf_core::{Real, wrap_angle};

/// Load torque as a function of time.
pub type LoadTorqueFn = Box<dyn Fn(Real) -> Real + Send + Sync>;

/// Stiff rotational mechanics.
///
/// States: mechanical angular speed `w_m` (rad/s) and unwrapped rotor angle
/// `theta_m` (rad):
///
/// ```text
/// J * dw_m/dt = tau_m - b * w_m - tau_l(t)
/// d theta_m / dt = w_m
/// ```
///
/// The electromagnetic torque `tau_m` is a coupling input from the machine;
/// the external load torque `tau_l(t)` is an injected closure of time.
pub struct Mechanics {
    /// Total moment of inertia (kg·m²)
    j: Real,
    /// Viscous friction coefficient (N·m·s/rad)
    b: Real,
    tau_l: LoadTorqueFn,
    // States
    w_m: Real,
    theta_m: Real,
    // Input
    tau_m: Real,
}

impl Mechanics {
    /// Create mechanics with inertia `j` and viscous friction `b`, no load.
    ///
    /// # Errors
    /// Fails if `j` is not positive or `b` is negative.
    pub fn new(j: Real, b: Real) -> ModelResult<Self> {
        if !(j.is_finite() && j > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "inertia must be positive",
            });
        }
        if !(b.is_finite() && b >= 0.0) {
            return Err(ModelError::InvalidArg {
                what: "friction coefficient cannot be negative",
            });
        }
        Ok(Self {
            j,
            b,
            tau_l: Box::new(|_| 0.0),
            w_m: 0.0,
            theta_m: 0.0,
            tau_m: 0.0,
        })
    }

    /// Replace the external load torque profile.
    pub fn with_load_torque(mut self, tau_l: LoadTorqueFn) -> Self {
        self.tau_l = tau_l;
        self
    }

    /// Set the electromagnetic torque input for this evaluation.
    pub fn set_input_torque(&mut self, tau_m: Real) {
        self.tau_m = tau_m;
    }

    /// Mechanical speed state (rad/s).
    pub fn speed(&self) -> Real {
        self.w_m
    }

    /// Measured rotor speed (rad/s).
    pub fn meas_speed(&self) -> Real {
        self.w_m
    }

    /// Measured rotor angle wrapped to `[-pi, pi)`.
    pub fn meas_position(&self) -> Real {
        wrap_angle(self.theta_m)
    }
}

impl std::fmt::Debug for Mechanics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mechanics")
            .field("j", &self.j)
            .field("b", &self.b)
            .field("w_m", &self.w_m)
            .field("theta_m", &self.theta_m)
            .finish_non_exhaustive()
    }
}

impl Subsystem for Mechanics {
    fn name(&self) -> &'static str {
        "mechanics"
    }

    fn state_spec(&self) -> Vec<StateSpec> {
        vec![StateSpec::real("w_m"), StateSpec::real("theta_m")]
    }

    fn state(&self) -> Vec<Sv> {
        vec![Sv::Real(self.w_m), Sv::Real(self.theta_m)]
    }

    fn set_state(&mut self, values: &[Sv]) -> ModelResult<()> {
        match values {
            [w_m, theta_m] => {
                self.w_m = w_m.expect_real()?;
                self.theta_m = theta_m.expect_real()?;
                Ok(())
            }
            _ => Err(ModelError::Invariant {
                what: "mechanics: expected two state values",
            }),
        }
    }

    fn set_outputs(&mut self, _t: Real) -> ModelResult<()> {
        // Speed and angle are states; nothing algebraic to cache.
        Ok(())
    }

    fn rhs(&self, t: Real) -> ModelResult<Vec<Sv>> {
        let tau_l = (self.tau_l)(t);
        if !tau_l.is_finite() {
            return Err(ModelError::NonFinite {
                what: "load torque",
                value: tau_l,
            });
        }
        let dw_m = (self.tau_m - self.b * self.w_m - tau_l) / self.j;
        if !dw_m.is_finite() {
            return Err(ModelError::NonFinite {
                what: "mechanics speed derivative",
                value: dw_m,
            });
        }
        Ok(vec![Sv::Real(dw_m), Sv::Real(self.w_m)])
    }
}
