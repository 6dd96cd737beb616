//! Carrier comparison: exact PWM switching instants from duty ratios.
//!
//! Converts three duty ratios valid over a half-carrier interval into the
//! exact sorted sequence of switching states that triangular-carrier
//! natural-sampling PWM would produce, without root-finding the
//! carrier/reference crossings. Duty ratios are quantized onto an integer
//! carrier grid, so interval boundaries are exact fractions of the requested
//! interval and the sequence covers it without floating accumulation drift.

use crate::error::{SimError, SimResult};
use vf_core::Real;

/// Per-phase binary switching state of a two-level converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchingState {
    pub a: bool,
    pub b: bool,
    pub c: bool,
}

impl SwitchingState {
    /// Actuation vector form: 1.0 for a phase connected to the positive
    /// rail, 0.0 for the negative rail.
    pub fn as_abc(&self) -> [Real; 3] {
        [
            if self.a { 1.0 } else { 0.0 },
            if self.b { 1.0 } else { 0.0 },
            if self.c { 1.0 } else { 0.0 },
        ]
    }
}

/// One half-carrier's worth of switching intervals.
///
/// Stored as monotone interval boundaries: `boundaries[0] == 0` and
/// `*boundaries.last() == t_s` exactly, with one switching state per
/// interval. Keeping boundaries instead of accumulated durations lets the
/// driver sub-step between exact instants, so the running total can never
/// drift past the interval.
#[derive(Clone, Debug)]
pub struct SwitchingSequence {
    boundaries: Vec<Real>,
    states: Vec<SwitchingState>,
}

impl SwitchingSequence {
    /// Number of switching intervals (at most four).
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Interval boundaries relative to the start of the half-carrier.
    pub fn boundaries(&self) -> &[Real] {
        &self.boundaries
    }

    pub fn states(&self) -> &[SwitchingState] {
        &self.states
    }

    /// Total covered time; equals the requested interval exactly.
    pub fn total(&self) -> Real {
        *self.boundaries.last().unwrap_or(&0.0)
    }

    /// Interval durations, all non-negative.
    pub fn durations(&self) -> Vec<Real> {
        self.boundaries.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Iterate `(start, end, state)` triples.
    pub fn intervals(&self) -> impl Iterator<Item = (Real, Real, SwitchingState)> + '_ {
        self.boundaries
            .windows(2)
            .zip(&self.states)
            .map(|(w, s)| (w[0], w[1], *s))
    }
}

/// Triangular-carrier comparison with quantized carrier levels.
///
/// Successive calls alternate between the rising-edge half (outputs start
/// low and switch high) and the falling-edge half (its exact time-reverse),
/// so two consecutive calls cover one full carrier period. The carrier
/// direction flag and the quantization level count are the only persistent
/// state.
#[derive(Clone, Debug)]
pub struct CarrierComparison {
    levels: u32,
    rising_edge: bool,
}

impl Default for CarrierComparison {
    fn default() -> Self {
        // 2^12 carrier levels mirror a typical digital PWM timer resolution.
        Self {
            levels: 1 << 12,
            rising_edge: true,
        }
    }
}

impl CarrierComparison {
    /// Create a comparison with `levels >= 2` quantized carrier levels.
    pub fn new(levels: u32) -> SimResult<Self> {
        if levels < 2 {
            return Err(SimError::InvalidArg {
                what: "carrier must have at least two quantization levels",
            });
        }
        Ok(Self {
            levels,
            rising_edge: true,
        })
    }

    /// Compute the switching sequence for one half-carrier of length `t_s`.
    ///
    /// Duty ratios must lie in `[0, 1]`; values exactly at 0 or 1 produce no
    /// crossing for that phase. Phases whose quantized crossings coincide
    /// are merged into a single combined transition.
    ///
    /// # Errors
    /// Fails fast on a non-positive interval or a duty ratio outside
    /// `[0, 1]`; duty ratios are never clamped.
    pub fn sequence(&mut self, t_s: Real, d_abc: [Real; 3]) -> SimResult<SwitchingSequence> {
        if !(t_s.is_finite() && t_s > 0.0) {
            return Err(SimError::InvalidArg {
                what: "half-carrier interval must be positive",
            });
        }
        for d in d_abc {
            if !(d.is_finite() && (0.0..=1.0).contains(&d)) {
                return Err(SimError::InvalidArg {
                    what: "duty ratio outside [0, 1]",
                });
            }
        }

        let rising = self.rising_edge;
        self.rising_edge = !self.rising_edge;

        let levels = self.levels;
        let quantized = d_abc.map(|d| (d * levels as Real).round() as u32);
        // Carrier level at which each phase switches: a rising-edge half
        // starts low and switches high once the remaining time equals the
        // duty ratio; the falling-edge half is its time-reverse.
        let crossings = quantized.map(|l| if rising { levels - l } else { l });

        let level_bounds = level_boundaries(levels, crossings);
        let boundaries: Vec<Real> = level_bounds
            .iter()
            .map(|&b| t_s * (b as Real / levels as Real))
            .collect();
        let states: Vec<SwitchingState> = level_bounds[..level_bounds.len() - 1]
            .iter()
            .map(|&start| SwitchingState {
                a: phase_high(crossings[0], start, rising),
                b: phase_high(crossings[1], start, rising),
                c: phase_high(crossings[2], start, rising),
            })
            .collect();

        debug_assert_eq!(*boundaries.last().unwrap_or(&t_s), t_s);
        Ok(SwitchingSequence { boundaries, states })
    }
}

/// Sorted, deduplicated interval boundaries on the quantized carrier grid,
/// always starting at 0 and ending at `levels`.
fn level_boundaries(levels: u32, crossings: [u32; 3]) -> Vec<u32> {
    let mut bounds = vec![0, crossings[0], crossings[1], crossings[2], levels];
    bounds.sort_unstable();
    bounds.dedup();
    bounds
}

/// Whether a phase with the given crossing level is high on the interval
/// starting at `start`.
fn phase_high(crossing: u32, start: u32, rising: bool) -> bool {
    if rising {
        start >= crossing
    } else {
        start < crossing
    }
}
