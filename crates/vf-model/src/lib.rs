//! Continuous-time plant models for voltflow drives.
//!
//! Provides:
//! - State vector codec: packs named real/complex subsystem states into the
//!   flat vector handed to the integrator, and back
//! - Subsystem trait for heterogeneous physical models
//! - Concrete subsystems: voltage-source converter, induction machine,
//!   mechanics, L filter, grid source
//! - Fixed compositions wired behind the `Plant` trait: machine drive and
//!   grid converter

pub mod converter;
pub mod drive;
pub mod error;
pub mod grid;
pub mod grid_source;
pub mod lfilter;
pub mod machine;
pub mod mechanics;
pub mod plant;
pub mod single;
pub mod state;
pub mod subsystem;

// Re-exports for public API
pub use converter::VoltageSourceConverter;
pub use drive::MachineDrive;
pub use error::{ModelError, ModelResult};
pub use grid::GridConverter;
pub use grid_source::GridSource;
pub use lfilter::LFilter;
pub use machine::{InductionMachine, InductionMachineParams};
pub use mechanics::Mechanics;
pub use plant::Plant;
pub use single::SingleSubsystem;
pub use state::{StateCodec, StateSpec, Sv, SvKind};
pub use subsystem::Subsystem;
