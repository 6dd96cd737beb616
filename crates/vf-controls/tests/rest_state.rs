//! A drive at rest under a symmetric duty command must stay at rest,
//! regardless of how the command is actuated.

use vf_controls::ConstantDutyController;
use vf_model::{
    InductionMachine, InductionMachineParams, MachineDrive, Mechanics, Plant,
    VoltageSourceConverter,
};
use vf_sim::{PwmMode, SimOptions, run_sim};

fn drive() -> MachineDrive {
    MachineDrive::new(
        VoltageSourceConverter::new(540.0).unwrap(),
        InductionMachine::new(InductionMachineParams::p2_2kw()).unwrap(),
        Mechanics::new(0.015, 0.0).unwrap(),
    )
}

fn final_state_norm(pwm: PwmMode, d_abc: [f64; 3]) -> f64 {
    let mut plant = drive();
    let mut controller = ConstantDutyController::new(250e-6, d_abc).unwrap();
    let opts = SimOptions {
        t_stop: 0.05,
        pwm,
        initial_actuation: d_abc,
        ..Default::default()
    };
    let out = run_sim(&mut plant, &mut controller, &opts).unwrap();
    assert_eq!(out.t_end, 0.05);
    plant.flat_state().unwrap().norm()
}

#[test]
fn symmetric_duty_keeps_rest_under_zero_order_hold() {
    let norm = final_state_norm(PwmMode::ZeroOrderHold, [0.5; 3]);
    assert!(norm < 1e-9, "state norm {norm}");
}

#[test]
fn symmetric_duty_keeps_rest_under_pwm() {
    // The carrier turns the symmetric command into all-low and all-high
    // halves; both are zero-sequence states with zero voltage vector.
    let norm = final_state_norm(PwmMode::CarrierComparison { levels: 1 << 12 }, [0.5; 3]);
    assert!(norm < 1e-9, "state norm {norm}");
}

#[test]
fn asymmetric_duty_excites_the_drive() {
    let norm = final_state_norm(PwmMode::ZeroOrderHold, [0.8, 0.3, 0.4]);
    assert!(norm > 1e-3, "state norm {norm}");
}
