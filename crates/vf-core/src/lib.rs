//! vf-core: stable foundation for voltflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - space_vector (three-phase <-> complex space-vector transforms)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod space_vector;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use space_vector::*;
