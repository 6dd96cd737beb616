//! Slew-rate limiter for reference signals.

use crate::error::{ControlError, ControlResult};
use vf_core::Real;

/// Limits how fast a reference may change per sampling period.
///
/// `limited` is pure and `advance` commits the new output, so a controller
/// can compute its command without side effects and advance the limiter
/// state afterwards.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rate: Real,
    y: Real,
}

impl RateLimiter {
    /// Create a limiter with maximum slew `rate` (units per second).
    pub fn new(rate: Real) -> ControlResult<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "slew rate must be positive",
            });
        }
        Ok(Self { rate, y: 0.0 })
    }

    /// Current limiter output.
    pub fn output(&self) -> Real {
        self.y
    }

    /// The value the limiter would output for input `u` over period `t_s`.
    pub fn limited(&self, t_s: Real, u: Real) -> Real {
        let max_delta = self.rate * t_s;
        self.y + (u - self.y).clamp(-max_delta, max_delta)
    }

    /// Commit one period: move the output toward `u` at the limited rate.
    pub fn advance(&mut self, t_s: Real, u: Real) -> Real {
        self.y = self.limited(t_s, u);
        self.y
    }
}
