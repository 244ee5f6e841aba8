//! Protein secondary structure prediction driven by PSI-BLAST.
//!
//! The pipeline turns a residue sequence into a per-position three-state
//! (helix / strand / loop) prediction:
//!
//! 1. [`PsiBlastStructureTool`](crate::PsiBlastStructureTool) runs an external
//!    PSI-BLAST process which writes a position-specific scoring matrix to a
//!    scratch file
//! 2. [`Pssm::from_file`](crate::Pssm::from_file) parses the matrix and
//!    [`normalize_pssm`](crate::normalize_pssm) maps its integer scores into
//!    `(0, 1)` with a logistic curve
//! 3. [`NnStructureTool`](crate::NnStructureTool) slides a 15-residue window over
//!    the normalized matrix through a two-stage feed-forward network, yielding a
//!    [`Q3Prediction`](crate::Q3Prediction)
//!
//! [`PredictSecondaryTask`](crate::PredictSecondaryTask) packages the whole run as
//! a leaf node for a task graph, translating tool events into task status,
//! progress and notes.

mod errors;
mod pssm;
mod q3;
mod neural;
mod options;
mod psiblast;
mod task;

pub use errors::PredictError;
pub use pssm::*;
pub use q3::*;
pub use neural::*;
pub use options::*;
pub use psiblast::*;
pub use task::*;
