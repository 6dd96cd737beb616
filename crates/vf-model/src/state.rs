//! State vector codec.
//!
//! A plant model is a collection of subsystems, each owning an ordered, named
//! set of real and complex state variables. A generic real-valued integrator
//! needs one flat `DVector<f64>`; the codec builds a stable
//! (subsystem, field) -> offset map once at model construction and converts
//! between the two representations without ever changing layout during a run.
//! Complex states pack as two adjacent reals `[re, im]`.

use crate::error::{ModelError, ModelResult};
use nalgebra::DVector;
use num_complex::Complex64;
use vf_core::Real;

/// Kind of a single state variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SvKind {
    Real,
    Complex,
}

impl SvKind {
    /// Number of flat (real) slots the kind occupies.
    pub fn width(self) -> usize {
        match self {
            SvKind::Real => 1,
            SvKind::Complex => 2,
        }
    }
}

/// Value of a single state variable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sv {
    Real(Real),
    Complex(Complex64),
}

impl Sv {
    pub fn kind(&self) -> SvKind {
        match self {
            Sv::Real(_) => SvKind::Real,
            Sv::Complex(_) => SvKind::Complex,
        }
    }

    pub fn expect_real(&self) -> ModelResult<Real> {
        match self {
            Sv::Real(v) => Ok(*v),
            Sv::Complex(_) => Err(ModelError::Invariant {
                what: "expected real state variable, found complex",
            }),
        }
    }

    pub fn expect_complex(&self) -> ModelResult<Complex64> {
        match self {
            Sv::Complex(v) => Ok(*v),
            Sv::Real(_) => Err(ModelError::Invariant {
                what: "expected complex state variable, found real",
            }),
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Sv::Real(v) => v.is_finite(),
            Sv::Complex(v) => v.re.is_finite() && v.im.is_finite(),
        }
    }
}

impl From<Real> for Sv {
    fn from(v: Real) -> Self {
        Sv::Real(v)
    }
}

impl From<Complex64> for Sv {
    fn from(v: Complex64) -> Self {
        Sv::Complex(v)
    }
}

/// Declaration of one named state variable in a subsystem's layout.
#[derive(Clone, Copy, Debug)]
pub struct StateSpec {
    pub name: &'static str,
    pub kind: SvKind,
}

impl StateSpec {
    pub fn real(name: &'static str) -> Self {
        Self {
            name,
            kind: SvKind::Real,
        }
    }

    pub fn complex(name: &'static str) -> Self {
        Self {
            name,
            kind: SvKind::Complex,
        }
    }
}

#[derive(Clone, Debug)]
struct Entry {
    subsystem: &'static str,
    name: &'static str,
    kind: SvKind,
    offset: usize,
}

/// Stable mapping between named per-subsystem states and the flat state vector.
#[derive(Clone, Debug)]
pub struct StateCodec {
    entries: Vec<Entry>,
    /// Entry index range per subsystem, in declaration order.
    groups: Vec<std::ops::Range<usize>>,
    flat_len: usize,
}

impl StateCodec {
    /// Build the codec from the ordered subsystem layouts.
    ///
    /// The order of subsystems and of variables within each subsystem fixes
    /// the flat layout for the lifetime of the model.
    pub fn new(layout: &[(&'static str, Vec<StateSpec>)]) -> Self {
        let mut entries = Vec::new();
        let mut groups = Vec::with_capacity(layout.len());
        let mut offset = 0;
        for (subsystem, specs) in layout {
            let start = entries.len();
            for spec in specs {
                entries.push(Entry {
                    subsystem,
                    name: spec.name,
                    kind: spec.kind,
                    offset,
                });
                offset += spec.kind.width();
            }
            groups.push(start..entries.len());
        }
        Self {
            entries,
            groups,
            flat_len: offset,
        }
    }

    /// Length of the flat state vector.
    pub fn flat_len(&self) -> usize {
        self.flat_len
    }

    /// Number of subsystems in the layout.
    pub fn n_subsystems(&self) -> usize {
        self.groups.len()
    }

    /// Flat offset and kind of a named variable, if present.
    pub fn offset_of(&self, subsystem: &str, name: &str) -> Option<(usize, SvKind)> {
        self.entries
            .iter()
            .find(|e| e.subsystem == subsystem && e.name == name)
            .map(|e| (e.offset, e.kind))
    }

    /// Pack per-subsystem values into a flat vector.
    ///
    /// `values` must hold one `Vec<Sv>` per subsystem, in layout order, with
    /// matching variable kinds; anything else is a wiring bug.
    pub fn pack(&self, values: &[Vec<Sv>]) -> ModelResult<DVector<Real>> {
        if values.len() != self.groups.len() {
            return Err(ModelError::Invariant {
                what: "pack: subsystem count mismatch",
            });
        }
        let mut x = DVector::zeros(self.flat_len);
        for (group, vals) in self.groups.iter().zip(values) {
            if group.len() != vals.len() {
                return Err(ModelError::Invariant {
                    what: "pack: state variable count mismatch",
                });
            }
            for (entry, sv) in self.entries[group.clone()].iter().zip(vals) {
                if entry.kind != sv.kind() {
                    return Err(ModelError::Invariant {
                        what: "pack: state variable kind mismatch",
                    });
                }
                match sv {
                    Sv::Real(v) => x[entry.offset] = *v,
                    Sv::Complex(v) => {
                        x[entry.offset] = v.re;
                        x[entry.offset + 1] = v.im;
                    }
                }
            }
        }
        Ok(x)
    }

    /// Unpack a flat vector into per-subsystem values in layout order.
    pub fn unpack(&self, x: &DVector<Real>) -> ModelResult<Vec<Vec<Sv>>> {
        if x.len() != self.flat_len {
            return Err(ModelError::Invariant {
                what: "unpack: flat state length mismatch",
            });
        }
        let mut out = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut vals = Vec::with_capacity(group.len());
            for entry in &self.entries[group.clone()] {
                let sv = match entry.kind {
                    SvKind::Real => Sv::Real(x[entry.offset]),
                    SvKind::Complex => {
                        Sv::Complex(Complex64::new(x[entry.offset], x[entry.offset + 1]))
                    }
                };
                vals.push(sv);
            }
            out.push(vals);
        }
        Ok(out)
    }

    /// Column names of the flat layout, `"subsystem.field"` with complex
    /// variables split into `.re`/`.im`. Used for post-run tables.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.flat_len);
        for entry in &self.entries {
            match entry.kind {
                SvKind::Real => names.push(format!("{}.{}", entry.subsystem, entry.name)),
                SvKind::Complex => {
                    names.push(format!("{}.{}.re", entry.subsystem, entry.name));
                    names.push(format!("{}.{}.im", entry.subsystem, entry.name));
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn demo_codec() -> StateCodec {
        StateCodec::new(&[
            (
                "machine",
                vec![StateSpec::complex("psi_s"), StateSpec::complex("psi_r")],
            ),
            (
                "mechanics",
                vec![StateSpec::real("w_m"), StateSpec::real("theta_m")],
            ),
        ])
    }

    #[test]
    fn flat_len_counts_complex_twice() {
        let codec = demo_codec();
        assert_eq!(codec.flat_len(), 6);
        assert_eq!(codec.n_subsystems(), 2);
    }

    #[test]
    fn offsets_are_stable() {
        let codec = demo_codec();
        assert_eq!(codec.offset_of("machine", "psi_s"), Some((0, SvKind::Complex)));
        assert_eq!(codec.offset_of("machine", "psi_r"), Some((2, SvKind::Complex)));
        assert_eq!(codec.offset_of("mechanics", "w_m"), Some((4, SvKind::Real)));
        assert_eq!(codec.offset_of("mechanics", "theta_m"), Some((5, SvKind::Real)));
        assert_eq!(codec.offset_of("mechanics", "missing"), None);
    }

    #[test]
    fn pack_unpack_round_trip() {
        let codec = demo_codec();
        let values = vec![
            vec![
                Sv::Complex(Complex64::new(1.0, -2.0)),
                Sv::Complex(Complex64::new(0.5, 0.25)),
            ],
            vec![Sv::Real(100.0), Sv::Real(-0.7)],
        ];
        let x = codec.pack(&values).unwrap();
        let back = codec.unpack(&x).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn pack_rejects_kind_mismatch() {
        let codec = demo_codec();
        let values = vec![
            vec![Sv::Real(1.0), Sv::Complex(Complex64::new(0.5, 0.25))],
            vec![Sv::Real(100.0), Sv::Real(-0.7)],
        ];
        assert!(codec.pack(&values).is_err());
    }

    #[test]
    fn unpack_rejects_length_mismatch() {
        let codec = demo_codec();
        let x = DVector::zeros(5);
        assert!(codec.unpack(&x).is_err());
    }

    #[test]
    fn column_names_split_complex() {
        let codec = demo_codec();
        assert_eq!(
            codec.column_names(),
            vec![
                "machine.psi_s.re",
                "machine.psi_s.im",
                "machine.psi_r.re",
                "machine.psi_r.im",
                "mechanics.w_m",
                "mechanics.theta_m",
            ]
        );
    }

    proptest! {
        #[test]
        fn round_trip_any_values(
            psi_s_re in -1e3_f64..1e3,
            psi_s_im in -1e3_f64..1e3,
            psi_r_re in -1e3_f64..1e3,
            psi_r_im in -1e3_f64..1e3,
            w_m in -1e4_f64..1e4,
            theta in -10.0_f64..10.0,
        ) {
            let codec = demo_codec();
            let values = vec![
                vec![
                    Sv::Complex(Complex64::new(psi_s_re, psi_s_im)),
                    Sv::Complex(Complex64::new(psi_r_re, psi_r_im)),
                ],
                vec![Sv::Real(w_m), Sv::Real(theta)],
            ];
            let x = codec.pack(&values).unwrap();
            let back = codec.unpack(&x).unwrap();
            prop_assert_eq!(back, values);
        }
    }
}
