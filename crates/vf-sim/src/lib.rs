//! Hybrid simulation engine for sampled-data drive systems.
//!
//! Provides:
//! - Adaptive Dormand-Prince RK45 integrator over the flat plant state
//! - Computational delay between controller output and actuation
//! - Carrier comparison: exact PWM switching-instant sequences from duty
//!   ratios, no zero-crossing search
//! - Controller trait for discrete-time controllers
//! - Continuous/discrete result logs with interpolation
//! - Simulation driver interleaving continuous integration with discrete
//!   controller execution

pub mod carrier;
pub mod controller;
pub mod delay;
pub mod error;
pub mod log;
pub mod sim;
pub mod solver;

// Re-exports for public API
pub use carrier::{CarrierComparison, SwitchingSequence, SwitchingState};
pub use controller::{ControlOutput, Controller};
pub use delay::ComputationalDelay;
pub use error::{SimError, SimResult};
pub use log::{ContinuousLog, DiscreteLog, TimeColumn, TimeTable};
pub use sim::{PwmMode, SimOptions, SimOutput, run_sim};
pub use solver::AdaptiveRk45;
