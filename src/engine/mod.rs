//! BMEP/torque/power engine.
//!
//! Pure functions from an engine spec and rpm grid to curves, plus the fuel
//! model and the Analyze report assembly. All three modes (Analyze, Match,
//! Design) go through [`curve::build_curve`], which is therefore the single
//! source of truth for curve semantics.

pub mod analysis;
pub mod curve;
pub mod fuel;

pub use analysis::*;
pub use curve::*;
pub use fuel::*;
