//! Discrete-time controllers for voltflow drives.
//!
//! Provides:
//! - Duty-ratio modulation (symmetrical suboscillation, equivalent to
//!   space-vector PWM)
//! - Slew-rate limiter for reference profiles
//! - Open-loop constant-duty controller for plant experiments
//! - V/Hz control for induction machine drives with stator-frequency
//!   damping

pub mod constant;
pub mod error;
pub mod modulation;
pub mod rate_limiter;
pub mod vhz;

// Re-exports for public API
pub use constant::ConstantDutyController;
pub use error::{ControlError, ControlResult};
pub use modulation::duty_ratios;
pub use rate_limiter::RateLimiter;
pub use vhz::{SpeedRef, VhzConfig, VhzController, VhzFbk, VhzMeas};
