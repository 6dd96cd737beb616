use crate::CoreError;
use std::f64::consts::PI;

/// Floating point type used throughout the engine
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Wrap an angle to `[-pi, pi)`.
pub fn wrap_angle(theta: Real) -> Real {
    let wrapped = (theta + PI).rem_euclid(2.0 * PI) - PI;
    // rem_euclid can return exactly 2*pi for inputs just below -pi
    if wrapped >= PI { wrapped - 2.0 * PI } else { wrapped }
}
