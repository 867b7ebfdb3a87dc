//! ISP front-end planning
//!
//! This module decides how a camera frame is spread over one or two front-end
//! instances, with separate modules for sensor timing, split geometry, stripe
//! distribution and the resource votes that follow from them.

pub mod bandwidth;
pub mod common;
pub mod config;
pub mod sensor;
pub mod session;
pub mod split;
pub mod stripe;

#[cfg(test)]
pub(crate) mod test_utils;

pub use common::{FrontendError, Rect, Result, StripeId, StripeSlots};

pub use config::{
    BandwidthConfig, CapabilityTable, ClockConfig, DualConfig, FrontendConfig,
    FrontendConfigBuilder, SplitOverride,
};

pub use sensor::{SensorGeometry, SensorTimingModel};

pub use split::{
    GeometryOracle, OracleInput, OracleOutput, PipelineMode, SplitGeometrySolver, SplitParameters,
    SupportWindowOracle,
};

pub use stripe::{
    AuxChannelConfig, FilterModule, FilterRequirement, FormatId, FormatTable, FullFrameConfig,
    OutputPort, PathConfig, StatsEngine, StatsEngineConfig, StripeConfigDistributor, StripeSet,
};

pub use bandwidth::{BandwidthModel, ClockModel, ClockOutcome, VoteOutcome};

pub use session::{FrameRequest, FrontendSession, RequestPlan};
