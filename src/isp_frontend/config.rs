//! Front-end configuration module
//!
//! Static override switches and per-chip capability limits consumed by the
//! planning stages.

pub mod types;

pub use types::{
    BandwidthConfig, CapabilityTable, ClockConfig, DualConfig, FrontendConfig,
    FrontendConfigBuilder, SplitOverride,
};
