//! Resource vote module
//!
//! This module computes the bandwidth and clock votes a front-end session
//! submits to the platform resource arbiter.

mod clock;
mod model;
pub mod types;


pub use clock::ClockModel;
pub use model::BandwidthModel;
pub use types::{
    ActiveVote, BandwidthVote, ClockOutcome, ClockVote, InstanceVote, PortVote, VoteOutcome,
    VoteSet,
};
