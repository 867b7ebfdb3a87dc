//! Geometry oracle call contract

use crate::isp_frontend::common::error::{FrontendError, Result};
use crate::isp_frontend::common::geometry::Rect;
use crate::isp_frontend::stripe::types::{
    FilterRequirement, OutputPort, PathConfig, StatsEngine, StatsEngineConfig,
};

/// What the oracle is asked to solve.
#[derive(Debug, Clone, Copy)]
pub struct OracleInput<'a> {
    pub frame_width: u32,
    pub frame_height: u32,
    pub filters: &'a [FilterRequirement],
    pub stats: &'a [StatsEngineConfig],
    pub paths: &'a [PathConfig],
}

/// Feasible range for the split column, in CAMIF coordinates. Signed so an
/// infeasible answer can be reported as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapBand {
    pub right_stripe_start: i64,
    pub left_stripe_end: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripeEdge {
    Left,
    Right,
}

/// Pixel ranges of one path inside one stripe, inclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OraclePathRange {
    pub port: OutputPort,
    /// Stripe-local input columns owned by the stripe
    pub first_input: u32,
    pub last_input: u32,
    /// Output columns in the path's full output frame
    pub first_output: u32,
    pub last_output: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleStatsSplit {
    pub engine: StatsEngine,
    pub horizontal_regions: u32,
    pub vertical_regions: u32,
    /// Stripe-local
    pub roi: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleStripe {
    pub edge: StripeEdge,
    /// Inclusive CAMIF columns fetched by the stripe
    pub first_pixel: u32,
    pub last_pixel: u32,
    pub paths: Vec<OraclePathRange>,
    pub stats: Vec<OracleStatsSplit>,
}

/// Owned oracle answer. Released on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleOutput {
    pub band: OverlapBand,
    stripes: Vec<OracleStripe>,
}

impl OracleOutput {
    pub fn new(band: OverlapBand, stripes: Vec<OracleStripe>) -> Self {
        Self { band, stripes }
    }

    /// The single stripe record tagged with `edge`.
    pub fn stripe(&self, edge: StripeEdge) -> Result<&OracleStripe> {
        let mut tagged = self.stripes.iter().filter(|s| s.edge == edge);
        let stripe = tagged
            .next()
            .ok_or_else(|| FrontendError::oracle(format!("no {edge:?} stripe record")))?;
        if tagged.next().is_some() {
            return Err(FrontendError::oracle(format!(
                "duplicate {edge:?} stripe records"
            )));
        }
        Ok(stripe)
    }

    pub fn stripes(&self) -> &[OracleStripe] {
        &self.stripes
    }
}

/// External per-filter spatial range solver.
pub trait GeometryOracle {
    fn solve(&self, input: &OracleInput<'_>) -> Result<OracleOutput>;
}
