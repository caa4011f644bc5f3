//! Inverse solving and design search.
//!
//! Both modes consume the engine component rather than re-deriving the
//! BMEP/torque/power identities:
//!
//! - `matching` inverts the curve model against user targets (algebraic, no
//!   iteration) and scores confidence
//! - `design` sweeps a displacement × cylinder grid, matching each candidate
//!   against the targets, then filters and ranks

pub mod design;
pub mod matching;

pub use design::*;
pub use matching::*;
