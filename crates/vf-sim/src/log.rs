//! Simulation result logs.
//!
//! Two time bases come out of a hybrid run: the continuous log records the
//! flat plant state at every accepted integrator step, and the discrete log
//! records controller quantities at every sampling instant. Both export to
//! a serializable named-column table.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vf_core::Real;
use vf_model::StateCodec;

/// A single named series sharing a table's time base.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeColumn {
    pub name: String,
    pub values: Vec<Real>,
}

/// Named columns over a shared time base, ready for serialization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeTable {
    pub t: Vec<Real>,
    pub columns: Vec<TimeColumn>,
}

impl TimeTable {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&[Real]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }
}

/// Continuous-time trajectory: the flat plant state at every accepted
/// integrator step, including the initial condition at the start time.
#[derive(Clone, Debug, Default)]
pub struct ContinuousLog {
    t: Vec<Real>,
    x: Vec<DVector<Real>>,
}

impl ContinuousLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, t: Real, x: &DVector<Real>) {
        self.t.push(t);
        self.x.push(x.clone());
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn times(&self) -> &[Real] {
        &self.t
    }

    pub fn states(&self) -> &[DVector<Real>] {
        &self.x
    }

    /// Linearly interpolate the state at time `t`.
    ///
    /// Returns `None` for an empty log or a query outside the recorded
    /// range. Exact sample hits return the stored state; repeated sample
    /// times (a committed discrete transition) resolve to the later one.
    pub fn sample_at(&self, t: Real) -> Option<DVector<Real>> {
        let first = *self.t.first()?;
        let last = *self.t.last()?;
        if t < first || t > last {
            return None;
        }
        // First index with time > t; the bracketing samples are i-1 and i.
        let i = self.t.partition_point(|&tk| tk <= t);
        if i == 0 {
            return Some(self.x[0].clone());
        }
        if i == self.t.len() {
            return Some(self.x[i - 1].clone());
        }
        let (t0, t1) = (self.t[i - 1], self.t[i]);
        if t1 == t0 {
            return Some(self.x[i].clone());
        }
        let w = (t - t0) / (t1 - t0);
        Some(&self.x[i - 1] * (1.0 - w) + &self.x[i] * w)
    }

    /// Export as a named-column table using the plant's state codec for
    /// column names. Complex states become `.re`/`.im` column pairs.
    pub fn to_table(&self, codec: &StateCodec) -> TimeTable {
        let names = codec.column_names();
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(j, name)| TimeColumn {
                name,
                values: self.x.iter().map(|xk| xk[j]).collect(),
            })
            .collect();
        TimeTable {
            t: self.t.clone(),
            columns,
        }
    }
}

/// Discrete-time record of each controller execution.
#[derive(Clone, Debug, Default)]
pub struct DiscreteLog {
    t: Vec<Real>,
    t_s: Vec<Real>,
    d_ref: Vec<[Real; 3]>,
    d_act: Vec<[Real; 3]>,
    signals: BTreeMap<&'static str, Vec<Real>>,
}

impl DiscreteLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sampling instant: the commanded duty ratios, the delayed
    /// ones actually applied, and any controller telemetry.
    pub fn push(
        &mut self,
        t: Real,
        t_s: Real,
        d_ref: [Real; 3],
        d_act: [Real; 3],
        telemetry: &[(&'static str, Real)],
    ) {
        self.t.push(t);
        self.t_s.push(t_s);
        self.d_ref.push(d_ref);
        self.d_act.push(d_act);
        for &(name, value) in telemetry {
            self.signals.entry(name).or_default().push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn times(&self) -> &[Real] {
        &self.t
    }

    pub fn sampling_periods(&self) -> &[Real] {
        &self.t_s
    }

    pub fn commanded_duty(&self) -> &[[Real; 3]] {
        &self.d_ref
    }

    pub fn applied_duty(&self) -> &[[Real; 3]] {
        &self.d_act
    }

    /// Telemetry series by name.
    pub fn signal(&self, name: &str) -> Option<&[Real]> {
        self.signals.get(name).map(|v| v.as_slice())
    }

    /// Export as a named-column table.
    pub fn to_table(&self) -> TimeTable {
        let mut columns = vec![TimeColumn {
            name: "t_s".into(),
            values: self.t_s.clone(),
        }];
        for (prefix, data) in [("d_ref", &self.d_ref), ("d_act", &self.d_act)] {
            for (k, phase) in ["a", "b", "c"].iter().enumerate() {
                columns.push(TimeColumn {
                    name: format!("{prefix}.{phase}"),
                    values: data.iter().map(|d| d[k]).collect(),
                });
            }
        }
        for (name, values) in &self.signals {
            columns.push(TimeColumn {
                name: (*name).into(),
                values: values.clone(),
            });
        }
        TimeTable {
            t: self.t.clone(),
            columns,
        }
    }
}
