//! HiGHS backend for `replen-core` models.
//!
//! [`HighsSolver`] implements [`replen_core::Solver`]: it lowers the model's
//! column-first storage into a HiGHS row problem, forwards warm-start hints as
//! a MIP start and maps the HiGHS status back onto [`replen_core::SolverStatus`].

pub mod ffi;
pub mod solver;
mod status;

pub use ffi::{HighsModel, HighsModelError, HighsOption, HighsStatus, ObjectiveSense};
pub use solver::HighsSolver;
