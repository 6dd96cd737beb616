//! Computational delay between controller output and actuation.

use crate::error::{SimError, SimResult};
use std::collections::VecDeque;
use vf_core::Real;

/// Fixed-length FIFO modeling the latency between when the controller
/// computes an actuation command and when it reaches the plant.
///
/// For buffer length `N`, the value returned on call `n` equals the value
/// submitted on call `n - N`; the first `N` calls return the configured
/// initial hold value. `N = 0` is disallowed: one sample is the realistic
/// floor for a digital controller.
#[derive(Clone, Debug)]
pub struct ComputationalDelay {
    buf: VecDeque<[Real; 3]>,
}

impl ComputationalDelay {
    /// Create a delay line of `len >= 1` samples, pre-filled with `initial`.
    pub fn new(len: usize, initial: [Real; 3]) -> SimResult<Self> {
        if len == 0 {
            return Err(SimError::InvalidArg {
                what: "delay length must be at least one sample",
            });
        }
        let mut buf = VecDeque::with_capacity(len + 1);
        buf.resize(len, initial);
        Ok(Self { buf })
    }

    /// Number of samples of delay.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Submit a new actuation vector and return the delayed one.
    pub fn push(&mut self, value: [Real; 3]) -> [Real; 3] {
        self.buf.push_back(value);
        // Non-empty by construction: len >= 1 and we just pushed.
        self.buf.pop_front().unwrap_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_is_rejected() {
        assert!(ComputationalDelay::new(0, [0.0; 3]).is_err());
    }

    #[test]
    fn one_sample_delay() {
        let mut delay = ComputationalDelay::new(1, [0.0; 3]).unwrap();
        assert_eq!(delay.push([1.0, 2.0, 3.0]), [0.0; 3]);
        assert_eq!(delay.push([4.0, 5.0, 6.0]), [1.0, 2.0, 3.0]);
        assert_eq!(delay.push([7.0, 8.0, 9.0]), [4.0, 5.0, 6.0]);
    }

    #[test]
    fn n_sample_delay_property() {
        let n = 4;
        let mut delay = ComputationalDelay::new(n, [0.5; 3]).unwrap();
        let inputs: Vec<[Real; 3]> = (0..20).map(|i| [i as Real, 0.0, 0.0]).collect();
        for (call, input) in inputs.iter().enumerate() {
            let out = delay.push(*input);
            if call < n {
                assert_eq!(out, [0.5; 3], "call {call} should return the hold value");
            } else {
                assert_eq!(out, inputs[call - n], "call {call}");
            }
        }
    }

    #[test]
    fn length_is_fixed() {
        let mut delay = ComputationalDelay::new(3, [0.0; 3]).unwrap();
        for i in 0..10 {
            let _ = delay.push([i as Real; 3]);
            assert_eq!(delay.len(), 3);
        }
    }
}
