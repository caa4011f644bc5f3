//! Domain types used throughout the estimator.
//!
//! This module defines:
//!
//! - input enums (`Cycle`, `Fuel`, `ProfileKind`) and the geometry model
//! - engine/run/vehicle specification structs
//! - computed outputs (`CurveSet`, `Analysis`, `MatchResult`, `Candidate`)

pub mod types;

pub use types::*;
