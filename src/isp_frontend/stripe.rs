//! Stripe distribution module
//!
//! This module turns a split decision into per-instance configuration records
//! and converts per-path pixel ranges into transport byte widths.

mod distributor;
pub mod format;
mod history;
pub mod types;


pub use distributor::{StripeConfigDistributor, split_region_count};
pub use format::{FormatDescriptor, FormatId, FormatTable, Layout, TileSpan, TransportWidth};
pub use history::ModuleHistory;
pub use types::{
    AuxChannelConfig, FilterModule, FilterRequirement, FullFrameConfig, OutputPort, PathConfig,
    PathGeometry, PortKind, StatsEngine, StatsEngineConfig, StatsRegionSplit, StripeRecord,
    StripeSet,
};
