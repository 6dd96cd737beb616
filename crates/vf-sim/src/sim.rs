//! Simulation driver: interleaves continuous-time integration with
//! discrete-time controller execution.

use crate::carrier::CarrierComparison;
use crate::controller::Controller;
use crate::delay::ComputationalDelay;
use crate::error::{SimError, SimResult};
use crate::log::{ContinuousLog, DiscreteLog};
use crate::solver::AdaptiveRk45;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vf_core::Real;
use vf_model::Plant;

/// How commanded duty ratios are applied to the plant over one sampling
/// period.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum PwmMode {
    /// Hold the duty ratios directly as the actuation for the whole period.
    ZeroOrderHold,
    /// Carrier comparison: integrate between exact switching instants, with
    /// each phase at the positive or negative rail within an interval.
    CarrierComparison { levels: u32 },
}

/// Configuration of one simulation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimOptions {
    /// End time of the run (seconds).
    pub t_stop: Real,
    /// Continuous-time integrator settings.
    pub solver: AdaptiveRk45,
    /// Actuation scheme for the commanded duty ratios.
    pub pwm: PwmMode,
    /// Computational delay between command and actuation, in samples (>= 1).
    pub delay_len: usize,
    /// Actuation applied during the delay's initial hold.
    pub initial_actuation: [Real; 3],
    /// Cap on recorded continuous samples; exceeding it aborts the run.
    pub max_samples: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            t_stop: 1.0,
            solver: AdaptiveRk45::default(),
            pwm: PwmMode::ZeroOrderHold,
            delay_len: 1,
            initial_actuation: [0.0; 3],
            max_samples: 10_000_000,
        }
    }
}

impl SimOptions {
    fn validate(&self) -> SimResult<()> {
        if !(self.t_stop.is_finite() && self.t_stop > 0.0) {
            return Err(SimError::InvalidArg {
                what: "t_stop must be positive",
            });
        }
        self.solver.validate()?;
        if self.delay_len == 0 {
            return Err(SimError::InvalidArg {
                what: "delay_len must be at least one sample",
            });
        }
        if self.max_samples == 0 {
            return Err(SimError::InvalidArg {
                what: "max_samples must be positive",
            });
        }
        Ok(())
    }
}

/// Results of a simulation run.
#[derive(Clone, Debug)]
pub struct SimOutput {
    /// Flat plant state at every accepted integrator step.
    pub continuous: ContinuousLog,
    /// Controller record at every sampling instant.
    pub discrete: DiscreteLog,
    /// Time actually reached; equals `t_stop` unless the run was aborted.
    pub t_end: Real,
}

/// Run a hybrid simulation of `plant` under `controller`.
///
/// Each sampling period: the controller measures the committed plant state,
/// computes duty ratios and the next sampling period, the command passes
/// through the computational delay, and the plant is integrated to the next
/// sampling instant with the delayed command applied either as a zero-order
/// hold or as an exact PWM switching sequence. The final period is truncated
/// at `t_stop`.
///
/// # Errors
/// Propagates integrator, model, and controller failures; additionally fails
/// on an invalid configuration, a non-positive controller sampling period,
/// or when the continuous log exceeds `max_samples`.
pub fn run_sim<P, C>(plant: &mut P, controller: &mut C, opts: &SimOptions) -> SimResult<SimOutput>
where
    P: Plant,
    C: Controller<P>,
{
    opts.validate()?;

    let mut delay = ComputationalDelay::new(opts.delay_len, opts.initial_actuation)?;
    let mut carrier = match opts.pwm {
        PwmMode::ZeroOrderHold => None,
        PwmMode::CarrierComparison { levels } => Some(CarrierComparison::new(levels)?),
    };

    let mut continuous = ContinuousLog::new();
    let mut discrete = DiscreteLog::new();

    let mut x = plant.flat_state().map_err(|e| SimError::model(0.0, e))?;
    continuous.push(0.0, &x);

    debug!(
        t_stop = opts.t_stop,
        delay_len = opts.delay_len,
        "starting simulation run"
    );

    let mut t = 0.0;
    while t < opts.t_stop {
        // Discrete controller execution on the committed state.
        let meas = controller.measure(plant);
        let fbk = controller.feedback(&meas);
        let out = controller.output(t, &fbk)?;
        if !(out.t_s.is_finite() && out.t_s > 0.0) {
            return Err(SimError::Control {
                what: format!("controller returned non-positive sampling period at t = {t}"),
            });
        }
        controller.update(&fbk, &out);

        let d_act = delay.push(out.d_abc);
        let telemetry = controller.telemetry(&fbk);
        discrete.push(t, out.t_s, out.d_abc, d_act, &telemetry);

        let t_next = (t + out.t_s).min(opts.t_stop);

        let mut on_accept = |tk: Real, xk: &nalgebra::DVector<Real>| {
            continuous.push(tk, xk);
        };

        match &mut carrier {
            None => {
                plant.set_actuation(d_act);
                opts.solver
                    .integrate(plant, t, t_next, &mut x, &mut on_accept)?;
            }
            Some(carrier) => {
                // Integrate between exact switching instants. The sequence
                // always covers the full sampling period; segments past a
                // truncated final period are skipped.
                let seq = carrier.sequence(out.t_s, d_act)?;
                for (start, end, state) in seq.intervals() {
                    let seg_start = (t + start).min(t_next);
                    let seg_end = (t + end).min(t_next);
                    if seg_end <= seg_start {
                        continue;
                    }
                    plant.set_actuation(state.as_abc());
                    opts.solver
                        .integrate(plant, seg_start, seg_end, &mut x, &mut on_accept)?;
                }
            }
        }

        plant
            .commit_state(&x)
            .map_err(|e| SimError::model(t_next, e))?;
        t = t_next;

        if continuous.len() > opts.max_samples {
            warn!(t, samples = continuous.len(), "sample cap reached");
            return Err(SimError::Invariant {
                what: "continuous log exceeded max_samples",
            });
        }
    }

    debug!(
        t_end = t,
        continuous = continuous.len(),
        discrete = discrete.len(),
        "simulation run finished"
    );
    Ok(SimOutput {
        continuous,
        discrete,
        t_end: t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControlOutput;
    use vf_model::{Mechanics, SingleSubsystem, Sv, Subsystem};

    /// Issues a fixed duty command at a fixed rate; ignores measurements.
    struct FixedCommand {
        t_s: Real,
        d_abc: [Real; 3],
        calls: usize,
    }

    impl Controller<SingleSubsystem<Mechanics>> for FixedCommand {
        type Meas = ();
        type Fbk = ();

        fn measure(&self, _plant: &SingleSubsystem<Mechanics>) {}

        fn feedback(&self, _meas: &()) {}

        fn output(&self, _t: Real, _fbk: &()) -> SimResult<ControlOutput> {
            Ok(ControlOutput {
                t_s: self.t_s,
                d_abc: self.d_abc,
            })
        }

        fn update(&mut self, _fbk: &(), _out: &ControlOutput) {
            self.calls += 1;
        }
    }

    fn decaying_speed() -> SingleSubsystem<Mechanics> {
        let mut mech = Mechanics::new(1.0, 1.0).unwrap();
        mech.set_state(&[Sv::Real(1.0), Sv::Real(0.0)]).unwrap();
        SingleSubsystem::new(mech)
    }

    #[test]
    fn zero_order_hold_tracks_analytic_decay() {
        let mut plant = decaying_speed();
        let mut controller = FixedCommand {
            t_s: 1e-2,
            d_abc: [0.5; 3],
            calls: 0,
        };
        let opts = SimOptions {
            t_stop: 1.0,
            ..Default::default()
        };
        let out = run_sim(&mut plant, &mut controller, &opts).unwrap();
        assert_eq!(out.t_end, 1.0);
        let w = plant.inner().speed();
        assert!((w - (-1.0_f64).exp()).abs() < 1e-5, "w = {w}");
        // 100 sampling periods of 10 ms over 1 s.
        assert_eq!(controller.calls, 100);
        assert_eq!(out.discrete.len(), 100);
    }

    #[test]
    fn final_period_truncates_at_t_stop() {
        let mut plant = decaying_speed();
        let mut controller = FixedCommand {
            t_s: 3e-1,
            d_abc: [0.5; 3],
            calls: 0,
        };
        let opts = SimOptions {
            t_stop: 1.0,
            ..Default::default()
        };
        let out = run_sim(&mut plant, &mut controller, &opts).unwrap();
        assert_eq!(out.t_end, 1.0);
        assert_eq!(*out.continuous.times().last().unwrap(), 1.0);
        // Periods start at 0.0, 0.3, 0.6, 0.9; the last covers 0.1 s.
        assert_eq!(out.discrete.len(), 4);
    }

    #[test]
    fn delayed_command_is_logged() {
        let mut plant = decaying_speed();
        let mut controller = FixedCommand {
            t_s: 1e-2,
            d_abc: [0.7, 0.2, 0.9],
            calls: 0,
        };
        let opts = SimOptions {
            t_stop: 5e-2,
            delay_len: 2,
            initial_actuation: [0.5; 3],
            ..Default::default()
        };
        let out = run_sim(&mut plant, &mut controller, &opts).unwrap();
        // First two periods apply the initial hold, then the delayed command.
        assert_eq!(out.discrete.applied_duty()[0], [0.5; 3]);
        assert_eq!(out.discrete.applied_duty()[1], [0.5; 3]);
        assert_eq!(out.discrete.applied_duty()[2], [0.7, 0.2, 0.9]);
        assert_eq!(out.discrete.commanded_duty()[0], [0.7, 0.2, 0.9]);
    }

    #[test]
    fn pwm_mode_matches_zoh_for_this_plant() {
        // Mechanics ignores the duty actuation entirely, so both actuation
        // schemes must produce the same trajectory through the full driver.
        let run = |pwm: PwmMode| {
            let mut plant = decaying_speed();
            let mut controller = FixedCommand {
                t_s: 1e-2,
                d_abc: [0.25, 0.5, 0.75],
                calls: 0,
            };
            let opts = SimOptions {
                t_stop: 0.2,
                pwm,
                ..Default::default()
            };
            run_sim(&mut plant, &mut controller, &opts).unwrap();
            plant.inner().speed()
        };
        let w_zoh = run(PwmMode::ZeroOrderHold);
        let w_pwm = run(PwmMode::CarrierComparison { levels: 1 << 12 });
        // Different sub-interval layouts, same dynamics: agreement within
        // accumulated solver tolerance.
        assert!((w_zoh - w_pwm).abs() < 1e-5);
    }

    #[test]
    fn continuous_log_starts_at_initial_state() {
        let mut plant = decaying_speed();
        let mut controller = FixedCommand {
            t_s: 1e-2,
            d_abc: [0.5; 3],
            calls: 0,
        };
        let opts = SimOptions {
            t_stop: 1e-1,
            ..Default::default()
        };
        let out = run_sim(&mut plant, &mut controller, &opts).unwrap();
        assert_eq!(out.continuous.times()[0], 0.0);
        assert_eq!(out.continuous.states()[0][0], 1.0);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut plant = decaying_speed();
        let mut controller = FixedCommand {
            t_s: 1e-2,
            d_abc: [0.5; 3],
            calls: 0,
        };
        for opts in [
            SimOptions {
                t_stop: 0.0,
                ..Default::default()
            },
            SimOptions {
                delay_len: 0,
                ..Default::default()
            },
            SimOptions {
                max_samples: 0,
                ..Default::default()
            },
        ] {
            assert!(run_sim(&mut plant, &mut controller, &opts).is_err());
        }
    }

    #[test]
    fn non_positive_sampling_period_fails() {
        let mut plant = decaying_speed();
        let mut controller = FixedCommand {
            t_s: 0.0,
            d_abc: [0.5; 3],
            calls: 0,
        };
        let opts = SimOptions::default();
        assert!(run_sim(&mut plant, &mut controller, &opts).is_err());
    }
}
