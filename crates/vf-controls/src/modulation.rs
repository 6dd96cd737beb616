//! Duty-ratio computation for three-phase PWM.

use crate::error::{ControlError, ControlResult};
use num_complex::Complex64;
use vf_core::{Real, complex_to_abc};

/// Duty ratios realizing a stator voltage reference with symmetrical
/// suboscillation.
///
/// The zero-sequence voltage centers the phase voltages in the DC bus, which
/// makes the method identical to standard space-vector PWM. References
/// outside the linear modulation range are scaled down with the minimum
/// phase-error method, so the returned ratios always lie in `[0, 1]`.
///
/// # Errors
/// Fails on a non-positive DC-bus voltage or a non-finite reference.
pub fn duty_ratios(u_s_ref: Complex64, u_dc: Real) -> ControlResult<[Real; 3]> {
    if !(u_dc.is_finite() && u_dc > 0.0) {
        return Err(ControlError::InvalidArg {
            what: "DC-bus voltage must be positive",
        });
    }
    if !(u_s_ref.re.is_finite() && u_s_ref.im.is_finite()) {
        return Err(ControlError::InvalidArg {
            what: "voltage reference must be finite",
        });
    }

    // Phase voltages without the zero-sequence component
    let mut u_abc = complex_to_abc(u_s_ref);

    // Symmetrization by adding the zero-sequence voltage
    let u_max = u_abc[0].max(u_abc[1]).max(u_abc[2]);
    let u_min = u_abc[0].min(u_abc[1]).min(u_abc[2]);
    let u_0 = 0.5 * (u_max + u_min);
    for u in &mut u_abc {
        *u -= u_0;
    }

    // Minimum phase-error scaling keeps the ratios realizable
    let m = (2.0 / u_dc) * (u_max - u_0);
    if m > 1.0 {
        for u in &mut u_abc {
            *u /= m;
        }
    }

    Ok([
        u_abc[0] / u_dc + 0.5,
        u_abc[1] / u_dc + 0.5,
        u_abc[2] / u_dc + 0.5,
    ])
}
