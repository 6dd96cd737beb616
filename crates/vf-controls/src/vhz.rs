//! V/Hz control for induction machine drives.

use crate::error::{ControlError, ControlResult};
use crate::modulation::duty_ratios;
use crate::rate_limiter::RateLimiter;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use vf_core::{Real, abc_to_complex, exp_j, wrap_angle};
use vf_model::MachineDrive;
use vf_sim::{ControlOutput, Controller, SimResult};

/// Speed reference (electrical rad/s) as a function of time.
pub type SpeedRef = Box<dyn Fn(Real) -> Real + Send + Sync>;

/// Configuration of the V/Hz controller.
///
/// The machine parameters mirror the plant model; the gains follow the
/// open-loop stabilization scheme: `k_w` damps the slip estimate into the
/// stator frequency and `k_u` adds a high-frequency current feedback term to
/// the voltage reference.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VhzConfig {
    /// Stator resistance (ohm)
    pub r_s: Real,
    /// Rotor resistance (ohm)
    pub r_r: Real,
    /// Leakage inductance (H)
    pub l_sgm: Real,
    /// Magnetizing inductance (H)
    pub l_m: Real,
    /// Stator flux reference magnitude (Vs)
    pub psi_s_nom: Real,
    /// Stator frequency damping gain
    pub k_w: Real,
    /// Voltage feedback gain
    pub k_u: Real,
    /// Slew limit of the speed reference (rad/s per second)
    pub rate_limit: Real,
    /// Sampling period (s)
    pub t_s: Real,
}

impl VhzConfig {
    /// Tuning for the 2.2 kW, 400 V, 50 Hz machine.
    pub fn p2_2kw() -> Self {
        Self {
            r_s: 3.7,
            r_r: 2.1,
            l_sgm: 0.021,
            l_m: 0.224,
            // 400 V line-to-line at 50 Hz
            psi_s_nom: 400.0 * (2.0 / 3.0_f64).sqrt() / (2.0 * PI * 50.0),
            k_w: 4.0,
            k_u: 1.0,
            rate_limit: 2.0 * PI * 120.0,
            t_s: 250e-6,
        }
    }
}

/// Measurements taken at one sampling instant.
#[derive(Clone, Copy, Debug)]
pub struct VhzMeas {
    pub i_s_abc: [Real; 3],
    pub u_dc: Real,
}

/// Feedback signals derived from a measurement.
#[derive(Clone, Copy, Debug)]
pub struct VhzFbk {
    /// Stator current in stator-flux coordinates.
    pub i_s: Complex64,
    pub u_dc: Real,
}

/// Open-loop V/Hz controller with stator-frequency damping.
///
/// The base law drives the machine at a commanded electrical frequency with
/// a flux-proportional voltage. Two feedback terms stabilize it without a
/// speed sensor: the slip estimated from the measured current damps the
/// stator frequency, and a filtered current reference shapes the voltage.
/// The modulation angle is advanced by `1.5 * t_s * w_s` to compensate the
/// one-sample computational delay plus the half-sample hold delay.
pub struct VhzController {
    cfg: VhzConfig,
    speed_ref: SpeedRef,
    rate_limiter: RateLimiter,
    // Filter bandwidths, derived from the breakdown slip frequency
    alpha_i: Real,
    alpha_f: Real,
    // States
    i_s_ref: Complex64,
    w_r_ref: Real,
    theta_s: Real,
    t: Real,
}

impl fmt::Debug for VhzController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VhzController")
            .field("cfg", &self.cfg)
            .field("i_s_ref", &self.i_s_ref)
            .field("w_r_ref", &self.w_r_ref)
            .field("theta_s", &self.theta_s)
            .field("t", &self.t)
            .finish_non_exhaustive()
    }
}

impl VhzController {
    /// Create a controller from a validated configuration and a speed
    /// reference profile.
    ///
    /// # Errors
    /// Fails on non-physical machine parameters, a non-positive sampling
    /// period, or a non-positive flux reference.
    pub fn new(cfg: VhzConfig, speed_ref: SpeedRef) -> ControlResult<Self> {
        for (value, what) in [
            (cfg.r_s, "stator resistance must be positive"),
            (cfg.r_r, "rotor resistance must be positive"),
            (cfg.l_sgm, "leakage inductance must be positive"),
            (cfg.l_m, "magnetizing inductance must be positive"),
            (cfg.psi_s_nom, "flux reference must be positive"),
            (cfg.t_s, "sampling period must be positive"),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ControlError::InvalidArg { what });
            }
        }
        if !(cfg.k_w.is_finite() && cfg.k_u.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "gains must be finite",
            });
        }
        // Breakdown slip frequency of the rotor circuit sets the filter
        // bandwidths.
        let w_rb = cfg.r_r * (cfg.l_m + cfg.l_sgm) / (cfg.l_sgm * cfg.l_m);
        Ok(Self {
            rate_limiter: RateLimiter::new(cfg.rate_limit)?,
            cfg,
            speed_ref,
            alpha_i: 0.1 * w_rb,
            alpha_f: 0.1 * w_rb,
            i_s_ref: Complex64::new(0.0, 0.0),
            w_r_ref: 0.0,
            theta_s: 0.0,
            t: 0.0,
        })
    }

    /// Dynamic stator frequency and the slip estimate behind it.
    ///
    /// The slip is estimated from the measured current against the rotor
    /// flux operating point; damping it into the stator frequency suppresses
    /// the lightly damped flux oscillations of plain V/Hz control.
    fn stator_freq(&self, w_s_ref: Real, i_s: Complex64) -> (Real, Real) {
        let psi_r_ref = self.cfg.psi_s_nom - self.cfg.l_sgm * self.i_s_ref;
        let psi_r_ref_sqr = psi_r_ref.norm_sqr();
        if psi_r_ref_sqr > 0.0 {
            let w_r = self.cfg.r_r * (i_s * psi_r_ref.conj()).im / psi_r_ref_sqr;
            let w_s = w_s_ref + self.cfg.k_w * (self.w_r_ref - w_r);
            (w_s, w_r)
        } else {
            (0.0, 0.0)
        }
    }

    /// Stator voltage reference in stator-flux coordinates.
    fn voltage_reference(&self, w_s: Real, i_s: Complex64) -> Complex64 {
        let cfg = &self.cfg;
        // Nominal magnetizing current, used for RI compensation
        let i_sd_nom = cfg.psi_s_nom / (cfg.l_m + cfg.l_sgm);
        let i_s_ref0 = Complex64::new(i_sd_nom, self.i_s_ref.im);
        let k = cfg.k_u * cfg.l_sgm * Complex64::new(cfg.r_r / cfg.l_m, w_s);
        cfg.r_s * i_s_ref0 + Complex64::new(0.0, w_s * cfg.psi_s_nom) + k * (self.i_s_ref - i_s)
    }

    /// Limited speed reference at time `t`, without advancing the limiter.
    fn speed_reference(&self, t: Real) -> Real {
        self.rate_limiter.limited(self.cfg.t_s, (self.speed_ref)(t))
    }
}

impl Controller<MachineDrive> for VhzController {
    type Meas = VhzMeas;
    type Fbk = VhzFbk;

    fn measure(&self, plant: &MachineDrive) -> VhzMeas {
        VhzMeas {
            i_s_abc: plant.machine().meas_phase_currents(),
            u_dc: plant.converter().meas_dc_voltage(),
        }
    }

    fn feedback(&self, meas: &VhzMeas) -> VhzFbk {
        VhzFbk {
            i_s: exp_j(-self.theta_s) * abc_to_complex(meas.i_s_abc),
            u_dc: meas.u_dc,
        }
    }

    fn output(&self, t: Real, fbk: &VhzFbk) -> SimResult<ControlOutput> {
        let w_m_ref = self.speed_reference(t);
        let w_s_ref = w_m_ref + self.w_r_ref;
        let (w_s, _) = self.stator_freq(w_s_ref, fbk.i_s);
        let u_ref = self.voltage_reference(w_s, fbk.i_s);

        // Compensate the computational delay (t_s) and the hold (0.5 * t_s)
        let theta_comp = self.theta_s + 1.5 * self.cfg.t_s * w_s;
        let u_s_ref = exp_j(theta_comp) * u_ref;
        let d_abc = duty_ratios(u_s_ref, fbk.u_dc)?;

        Ok(ControlOutput {
            t_s: self.cfg.t_s,
            d_abc,
        })
    }

    fn update(&mut self, fbk: &VhzFbk, out: &ControlOutput) {
        let t_s = out.t_s;
        let w_m_ref = self.rate_limiter.advance(t_s, (self.speed_ref)(self.t));
        let w_s_ref = w_m_ref + self.w_r_ref;
        let (w_s, w_r) = self.stator_freq(w_s_ref, fbk.i_s);

        self.i_s_ref += t_s * self.alpha_i * (fbk.i_s - self.i_s_ref);
        self.w_r_ref += t_s * self.alpha_f * (w_r - self.w_r_ref);
        self.theta_s = wrap_angle(self.theta_s + t_s * w_s);
        self.t += t_s;
    }

    fn telemetry(&self, fbk: &VhzFbk) -> Vec<(&'static str, Real)> {
        vec![
            ("w_m_ref", self.speed_reference(self.t)),
            ("w_r_ref", self.w_r_ref),
            ("theta_s", self.theta_s),
            ("i_s.abs", fbk.i_s.norm()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vf_model::{
        InductionMachine, InductionMachineParams, MachineDrive, Mechanics, VoltageSourceConverter,
    };

    fn controller(speed: SpeedRef) -> VhzController {
        VhzController::new(VhzConfig::p2_2kw(), speed).unwrap()
    }

    fn drive() -> MachineDrive {
        MachineDrive::new(
            VoltageSourceConverter::new(540.0).unwrap(),
            InductionMachine::new(InductionMachineParams::p2_2kw()).unwrap(),
            Mechanics::new(0.015, 0.0).unwrap(),
        )
    }

    #[test]
    fn rejects_bad_config() {
        let cfg = VhzConfig {
            t_s: 0.0,
            ..VhzConfig::p2_2kw()
        };
        assert!(VhzController::new(cfg, Box::new(|_| 0.0)).is_err());
        let cfg = VhzConfig {
            l_m: -0.1,
            ..VhzConfig::p2_2kw()
        };
        assert!(VhzController::new(cfg, Box::new(|_| 0.0)).is_err());
    }

    #[test]
    fn zero_reference_at_rest_gives_ri_compensation_only() {
        let c = controller(Box::new(|_| 0.0));
        let plant = drive();
        let meas = c.measure(&plant);
        let fbk = c.feedback(&meas);
        let out = c.output(0.0, &fbk).unwrap();
        assert_eq!(out.t_s, 250e-6);
        // At rest with zero frequency the voltage reference reduces to the
        // small RI term: duty ratios stay near the 0.5 center.
        for d in out.d_abc {
            assert!((d - 0.5).abs() < 0.05, "duty {d}");
        }
    }

    #[test]
    fn nonzero_frequency_moves_the_duty_ratios() {
        let mut c = controller(Box::new(|_| 2.0 * PI * 50.0));
        let plant = drive();
        // Let the rate limiter ramp the reference up.
        for _ in 0..2000 {
            let meas = c.measure(&plant);
            let fbk = c.feedback(&meas);
            let out = c.output(c.t, &fbk).unwrap();
            c.update(&fbk, &out);
        }
        let meas = c.measure(&plant);
        let fbk = c.feedback(&meas);
        let out = c.output(c.t, &fbk).unwrap();
        let spread = out
            .d_abc
            .iter()
            .fold(0.0_f64, |m, d| m.max((d - 0.5).abs()));
        assert!(spread > 0.1, "spread {spread}");
    }

    #[test]
    fn modulation_angle_stays_wrapped() {
        let mut c = controller(Box::new(|_| 2.0 * PI * 50.0));
        let plant = drive();
        for _ in 0..10_000 {
            let meas = c.measure(&plant);
            let fbk = c.feedback(&meas);
            let out = c.output(c.t, &fbk).unwrap();
            c.update(&fbk, &out);
            assert!((-PI..PI).contains(&c.theta_s));
        }
    }

    #[test]
    fn telemetry_names_are_stable() {
        let c = controller(Box::new(|_| 0.0));
        let plant = drive();
        let fbk = c.feedback(&c.measure(&plant));
        let names: Vec<_> = c.telemetry(&fbk).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["w_m_ref", "w_r_ref", "theta_s", "i_s.abs"]);
    }
}
