//! Run-file persistence and CSV export.
//!
//! A run JSON is the "portable" representation of a completed run: the full
//! spec, the run configuration, the assumption list and the computed curve,
//! enough to reproduce a report without re-deriving inputs.

pub mod export;
pub mod run_file;

pub use export::*;
pub use run_file::*;
