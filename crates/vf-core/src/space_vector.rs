//! Space-vector transforms between three-phase and complex quantities.
//!
//! Amplitude-invariant convention: a balanced three-phase set with phase
//! amplitude `A` maps to a complex vector of magnitude `A`. The zero-sequence
//! component is discarded by `abc_to_complex` and not reproduced by
//! `complex_to_abc`.

use crate::numeric::Real;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Transform three phase values into a complex space vector.
///
/// `u = (2/3) * (u_a + u_b * exp(j*2*pi/3) + u_c * exp(-j*2*pi/3))`
pub fn abc_to_complex(abc: [Real; 3]) -> Complex64 {
    let [a, b, c] = abc;
    let re = (2.0 * a - b - c) / 3.0;
    let im = (b - c) / 3.0_f64.sqrt();
    Complex64::new(re, im)
}

/// Transform a complex space vector into three phase values.
///
/// Inverse of [`abc_to_complex`] for zero-sequence-free quantities:
/// `u_a = Re(u)`, `u_b = Re(u * exp(-j*2*pi/3))`, `u_c = Re(u * exp(j*2*pi/3))`.
pub fn complex_to_abc(u: Complex64) -> [Real; 3] {
    let half_sqrt3 = 3.0_f64.sqrt() / 2.0;
    [
        u.re,
        -0.5 * u.re + half_sqrt3 * u.im,
        -0.5 * u.re - half_sqrt3 * u.im,
    ]
}

/// Unit vector at angle `theta`: `exp(j*theta)`.
pub fn exp_j(theta: Real) -> Complex64 {
    Complex64::new(theta.cos(), theta.sin())
}

/// Electrical angle of one phase step, `2*pi/3`.
pub const PHASE_STEP: Real = 2.0 * PI / 3.0;
