//! Adaptive explicit time integrator.

use crate::error::{SimError, SimResult};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use vf_core::Real;
use vf_model::Plant;

/// Dormand-Prince 5(4) integrator with adaptive step control.
///
/// Integrates the plant's aggregate derivative over one interval, landing
/// exactly on the interval end (the last step is clamped, never overshot).
/// The controller accepts a step when the scaled error norm is below one and
/// adapts the step size with the usual fifth-order rule. Fully deterministic:
/// identical inputs produce a bit-identical trajectory.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AdaptiveRk45 {
    /// Relative error tolerance
    pub rel_tol: Real,
    /// Absolute error tolerance
    pub abs_tol: Real,
    /// Maximum step size (seconds)
    pub max_step: Real,
    /// Step size floor; collapsing below it aborts the run
    pub min_step: Real,
    /// Initial step size for each interval
    pub init_step: Real,
}

impl Default for AdaptiveRk45 {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            abs_tol: 1e-9,
            max_step: 1e-3,
            min_step: 1e-12,
            init_step: 1e-5,
        }
    }
}

// Dormand-Prince coefficients
const C: [Real; 6] = [1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
const A: [[Real; 6]; 6] = [
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
];
/// Fifth-order solution weights (identical to the last A row; FSAL pair).
const B5: [Real; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];
/// Embedded fourth-order weights used for the error estimate.
const B4: [Real; 7] = [
    5179.0 / 57600.0,
    0.0,
    7571.0 / 16695.0,
    393.0 / 640.0,
    -92097.0 / 339200.0,
    187.0 / 2100.0,
    1.0 / 40.0,
];

impl AdaptiveRk45 {
    /// Validate the tolerance and step configuration.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.rel_tol.is_finite() && self.rel_tol > 0.0) {
            return Err(SimError::InvalidArg {
                what: "rel_tol must be positive",
            });
        }
        if !(self.abs_tol.is_finite() && self.abs_tol > 0.0) {
            return Err(SimError::InvalidArg {
                what: "abs_tol must be positive",
            });
        }
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(SimError::InvalidArg {
                what: "max_step must be positive",
            });
        }
        if !(self.min_step.is_finite() && self.min_step > 0.0) {
            return Err(SimError::InvalidArg {
                what: "min_step must be positive",
            });
        }
        if self.min_step >= self.max_step {
            return Err(SimError::InvalidArg {
                what: "min_step must be below max_step",
            });
        }
        if !(self.init_step.is_finite() && self.init_step > 0.0) {
            return Err(SimError::InvalidArg {
                what: "init_step must be positive",
            });
        }
        Ok(())
    }

    /// Integrate `plant` from `t0` to `t1`, starting from `x`.
    ///
    /// `x` holds the accepted state at `t1` on return. `on_accept` is called
    /// once per accepted sub-step with the step's end time and state.
    ///
    /// # Errors
    /// - `SimError::StepSizeCollapse` when error control drives the step
    ///   below `min_step`
    /// - `SimError::NonFiniteState` when a stage or solution goes non-finite
    /// - `SimError::Model` for errors raised by the plant, tagged with the
    ///   offending time
    pub fn integrate<P: Plant>(
        &self,
        plant: &mut P,
        t0: Real,
        t1: Real,
        x: &mut DVector<Real>,
        on_accept: &mut dyn FnMut(Real, &DVector<Real>),
    ) -> SimResult<()> {
        if !(t0.is_finite() && t1.is_finite()) || t1 < t0 {
            return Err(SimError::InvalidArg {
                what: "integration interval must be finite and forward",
            });
        }
        if t1 == t0 {
            return Ok(());
        }

        let n = x.len();
        let mut t = t0;
        let mut h = self.init_step.min(self.max_step).min(t1 - t0);
        let mut k: Vec<DVector<Real>> = Vec::with_capacity(7);

        while t < t1 {
            // Clamp the last step so the interval end is hit exactly.
            let end_step = h >= t1 - t;
            if end_step {
                h = t1 - t;
            }

            k.clear();
            k.push(
                plant
                    .evaluate(t, x)
                    .map_err(|e| SimError::model(t, e))?,
            );
            for stage in 0..6 {
                let mut xs = x.clone();
                for (j, kj) in k.iter().enumerate() {
                    let a = A[stage][j];
                    if a != 0.0 {
                        xs.axpy(h * a, kj, 1.0);
                    }
                }
                let ts = t + C[stage] * h;
                k.push(
                    plant
                        .evaluate(ts, &xs)
                        .map_err(|e| SimError::model(ts, e))?,
                );
            }

            let mut x_new = x.clone();
            let mut err_vec = DVector::zeros(n);
            for (j, kj) in k.iter().enumerate() {
                if B5[j] != 0.0 {
                    x_new.axpy(h * B5[j], kj, 1.0);
                }
                let db = B5[j] - B4[j];
                if db != 0.0 {
                    err_vec.axpy(h * db, kj, 1.0);
                }
            }

            if x_new.iter().any(|v| !v.is_finite()) {
                return Err(SimError::NonFiniteState {
                    t,
                    what: "integrator solution",
                });
            }

            // Scaled RMS error norm
            let mut sum = 0.0;
            for i in 0..n {
                let scale = self.abs_tol + self.rel_tol * x[i].abs().max(x_new[i].abs());
                let e = err_vec[i] / scale;
                sum += e * e;
            }
            let err = if n > 0 { (sum / n as Real).sqrt() } else { 0.0 };

            if err <= 1.0 {
                let t_new = if end_step { t1 } else { t + h };
                *x = x_new;
                on_accept(t_new, x);
                t = t_new;
            }

            // Fifth-order step-size update, with the usual safety bounds
            let factor = if err > 0.0 {
                (0.9 * err.powf(-0.2)).clamp(0.2, 5.0)
            } else {
                5.0
            };
            h = (h * factor).min(self.max_step);
            if t < t1 && h < self.min_step {
                return Err(SimError::StepSizeCollapse { t, h });
            }
        }
        Ok(())
    }
}
