//! Expression types for inventory models.
//!
//! - `core`: Expr: linear terms + constant
//! - `constraint`: ConstraintExpr: expression with comparison sense and RHS

pub mod constraint;
pub mod core;

pub use constraint::{ComparisonSense, ConstraintExpr};
pub use core::Expr;
