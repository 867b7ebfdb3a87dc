//! Split geometry module
//!
//! This module decides between single- and dual-instance processing and
//! computes where the frame is split, either from static overrides or by
//! delegating to a geometry oracle.

mod mode;
mod oracle;
mod solver;
mod support_window_oracle;
pub mod types;

#[cfg(test)]
mod tests;

pub use mode::{MODE_RULES, ModeDecision, ModeInputs, ModeRule, evaluate_mode, evaluate_rules};
pub use oracle::{
    GeometryOracle, OracleInput, OracleOutput, OraclePathRange, OracleStatsSplit, OracleStripe,
    OverlapBand, StripeEdge,
};
pub use solver::{SplitGeometrySolver, SplitSolution};
pub use support_window_oracle::SupportWindowOracle;
pub use types::{PipelineMode, SplitParameters};
