//! Induction machine model in stator coordinates.

use crate::error::{ModelError, ModelResult};
use crate::state::{StateSpec, Sv};
use crate::subsystem::Subsystem;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use vf_core::{Real, complex_to_abc};

/// Electrical parameters of the Γ-equivalent induction machine model.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct InductionMachineParams {
    /// Stator resistance (ohm)
    pub r_s: Real,
    /// Rotor resistance (ohm)
    pub r_r: Real,
    /// Leakage inductance (H)
    pub l_sgm: Real,
    /// Magnetizing inductance (H)
    pub l_m: Real,
    /// Number of pole pairs
    pub n_p: u32,
}

impl InductionMachineParams {
    /// Parameters of a 2.2 kW, 400 V, 50 Hz machine.
    pub fn p2_2kw() -> Self {
        Self {
            r_s: 3.7,
            r_r: 2.1,
            l_sgm: 0.021,
            l_m: 0.224,
            n_p: 2,
        }
    }
}

/// Induction machine (Γ model) with complex stator and rotor flux states.
///
/// States: stator flux linkage `psi_s` and rotor flux linkage `psi_r`, both
/// space vectors in stator coordinates. Currents follow algebraically from
/// the fluxes:
///
/// ```text
/// i_r = (psi_r - psi_s) / L_sgm
/// i_s = psi_s / L_m - i_r
/// ```
///
/// Dynamics:
///
/// ```text
/// d psi_s / dt = u_s - R_s * i_s
/// d psi_r / dt = -R_r * i_r + j * n_p * w_m * psi_r
/// ```
///
/// with `u_s` the stator voltage input and `w_m` the mechanical rotor speed
/// input, both supplied by the owning model before `set_outputs`.
#[derive(Debug)]
pub struct InductionMachine {
    params: InductionMachineParams,
    // States
    psi_s: Complex64,
    psi_r: Complex64,
    // Inputs, refreshed by the model every evaluation
    u_s: Complex64,
    w_m: Real,
    // Cached outputs
    i_s: Complex64,
    i_r: Complex64,
    tau_m: Real,
}

impl InductionMachine {
    /// Create a machine from validated physical parameters.
    ///
    /// # Errors
    /// Fails on non-physical parameters (non-positive resistances,
    /// inductances, or pole-pair count); values are never clamped.
    pub fn new(params: InductionMachineParams) -> ModelResult<Self> {
        if !(params.r_s.is_finite() && params.r_s > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "stator resistance must be positive",
            });
        }
        if !(params.r_r.is_finite() && params.r_r > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "rotor resistance must be positive",
            });
        }
        if !(params.l_sgm.is_finite() && params.l_sgm > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "leakage inductance must be positive",
            });
        }
        if !(params.l_m.is_finite() && params.l_m > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "magnetizing inductance must be positive",
            });
        }
        if params.n_p == 0 {
            return Err(ModelError::InvalidArg {
                what: "pole-pair count must be at least one",
            });
        }
        Ok(Self {
            params,
            psi_s: Complex64::ZERO,
            psi_r: Complex64::ZERO,
            u_s: Complex64::ZERO,
            w_m: 0.0,
            i_s: Complex64::ZERO,
            i_r: Complex64::ZERO,
            tau_m: 0.0,
        })
    }

    /// Set the coupling inputs: stator voltage and mechanical rotor speed.
    pub fn set_inputs(&mut self, u_s: Complex64, w_m: Real) {
        self.u_s = u_s;
        self.w_m = w_m;
    }

    /// Currents from the flux states.
    fn currents(&self, psi_s: Complex64, psi_r: Complex64) -> (Complex64, Complex64) {
        let i_r = (psi_r - psi_s) / self.params.l_sgm;
        let i_s = psi_s / self.params.l_m - i_r;
        (i_s, i_r)
    }

    /// Cached electromagnetic torque (N·m).
    pub fn torque(&self) -> Real {
        self.tau_m
    }

    /// Cached stator current space vector.
    pub fn stator_current(&self) -> Complex64 {
        self.i_s
    }

    /// Measured phase currents, computed from the current state.
    pub fn meas_phase_currents(&self) -> [Real; 3] {
        let (i_s, _) = self.currents(self.psi_s, self.psi_r);
        complex_to_abc(i_s)
    }

    /// Stator flux linkage state.
    pub fn stator_flux(&self) -> Complex64 {
        self.psi_s
    }

    pub fn params(&self) -> &InductionMachineParams {
        &self.params
    }

    /// Stator current and torque reconstructed from raw flux values, for
    /// post-run time series.
    pub fn derive_outputs(&self, psi_s: Complex64, psi_r: Complex64) -> (Complex64, Real) {
        let (i_s, _) = self.currents(psi_s, psi_r);
        let tau_m = 1.5 * self.params.n_p as Real * (i_s * psi_s.conj()).im;
        (i_s, tau_m)
    }
}

impl Subsystem for InductionMachine {
    fn name(&self) -> &'static str {
        "machine"
    }

    fn state_spec(&self) -> Vec<StateSpec> {
        vec![StateSpec::complex("psi_s"), StateSpec::complex("psi_r")]
    }

    fn state(&self) -> Vec<Sv> {
        vec![Sv::Complex(self.psi_s), Sv::Complex(self.psi_r)]
    }

    fn set_state(&mut self, values: &[Sv]) -> ModelResult<()> {
        match values {
            [psi_s, psi_r] => {
                self.psi_s = psi_s.expect_complex()?;
                self.psi_r = psi_r.expect_complex()?;
                Ok(())
            }
            _ => Err(ModelError::Invariant {
                what: "machine: expected two state values",
            }),
        }
    }

    fn set_outputs(&mut self, _t: Real) -> ModelResult<()> {
        let (i_s, i_r) = self.currents(self.psi_s, self.psi_r);
        self.i_s = i_s;
        self.i_r = i_r;
        self.tau_m = 1.5 * self.params.n_p as Real * (i_s * self.psi_s.conj()).im;
        Ok(())
    }

    fn rhs(&self, _t: Real) -> ModelResult<Vec<Sv>> {
        let d_psi_s = self.u_s - self.params.r_s * self.i_s;
        let w_el = self.params.n_p as Real * self.w_m;
        let d_psi_r = -self.params.r_r * self.i_r + Complex64::new(0.0, w_el) * self.psi_r;
        for (v, what) in [
            (d_psi_s, "machine psi_s derivative"),
            (d_psi_r, "machine psi_r derivative"),
        ] {
            if !(v.re.is_finite() && v.im.is_finite()) {
                return Err(ModelError::NonFinite {
                    what,
                    value: v.norm_sqr(),
                });
            }
        }
        Ok(vec![Sv::Complex(d_psi_s), Sv::Complex(d_psi_r)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> InductionMachine {
        InductionMachine::new(InductionMachineParams::p2_2kw()).unwrap()
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut p = InductionMachineParams::p2_2kw();
        p.l_m = -0.1;
        assert!(InductionMachine::new(p).is_err());

        let mut p = InductionMachineParams::p2_2kw();
        p.r_s = 0.0;
        assert!(InductionMachine::new(p).is_err());

        let mut p = InductionMachineParams::p2_2kw();
        p.n_p = 0;
        assert!(InductionMachine::new(p).is_err());
    }

    #[test]
    fn zero_state_has_zero_outputs() {
        let mut m = machine();
        m.set_outputs(0.0).unwrap();
        assert_eq!(m.torque(), 0.0);
        assert!(m.stator_current().norm() < 1e-15);
        let d = m.rhs(0.0).unwrap();
        for sv in d {
            assert!(sv.expect_complex().unwrap().norm() < 1e-15);
        }
    }

    #[test]
    fn stator_voltage_drives_flux() {
        let mut m = machine();
        m.set_inputs(Complex64::new(100.0, 0.0), 0.0);
        m.set_outputs(0.0).unwrap();
        let d = m.rhs(0.0).unwrap();
        let d_psi_s = d[0].expect_complex().unwrap();
        assert!((d_psi_s.re - 100.0).abs() < 1e-12);
    }

    #[test]
    fn currents_follow_gamma_model() {
        let mut m = machine();
        let psi_s = Complex64::new(1.0, 0.0);
        let psi_r = Complex64::new(0.9, 0.0);
        m.set_state(&[Sv::Complex(psi_s), Sv::Complex(psi_r)]).unwrap();
        m.set_outputs(0.0).unwrap();
        let p = InductionMachineParams::p2_2kw();
        let i_r = (psi_r - psi_s) / p.l_sgm;
        let i_s = psi_s / p.l_m - i_r;
        assert!((m.stator_current() - i_s).norm() < 1e-12);
        assert!((m.i_r - i_r).norm() < 1e-12);
    }

    #[test]
    fn rhs_reports_nonfinite() {
        let mut m = machine();
        m.set_inputs(Complex64::new(Real::INFINITY, 0.0), 0.0);
        m.set_outputs(0.0).unwrap();
        assert!(m.rhs(0.0).is_err());
    }

    #[test]
    fn state_round_trip() {
        let mut m = machine();
        let values = vec![
            Sv::Complex(Complex64::new(0.1, 0.2)),
            Sv::Complex(Complex64::new(-0.3, 0.4)),
        ];
        m.set_state(&values).unwrap();
        assert_eq!(m.state(), values);
    }
}
