//! Vote types

use crate::isp_frontend::common::geometry::StripeSlots;
use crate::isp_frontend::stripe::types::OutputPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BandwidthVote {
    pub instantaneous_bytes_per_second: u64,
    /// Long-term average, present when the decoupled vote is computed
    pub active_bytes_per_second: Option<u64>,
}

/// Aggregate vote of one instance's pixel paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstanceVote {
    /// System-memory-facing traffic
    pub external: BandwidthVote,
    /// On-chip interconnect traffic
    pub internal: BandwidthVote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortVote {
    pub port: OutputPort,
    pub vote: BandwidthVote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveVote {
    Computed,
    Disabled,
}

/// Bandwidth votes for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteSet {
    pub instances: StripeSlots<Option<InstanceVote>>,
    /// Pixel-path ports
    pub ports: Vec<PortVote>,
    /// Auxiliary and raw channels
    pub channels: Vec<PortVote>,
    pub active_vote: ActiveVote,
    /// Startup safety multiplier was applied
    pub startup_boost: bool,
}

impl VoteSet {
    pub fn port(&self, port: OutputPort) -> Option<&BandwidthVote> {
        self.ports
            .iter()
            .chain(self.channels.iter())
            .find(|v| v.port == port)
            .map(|v| &v.vote)
    }

    /// External instance votes plus channel votes.
    pub fn total_instantaneous(&self) -> u64 {
        let instances: u64 = self
            .instances
            .occupied()
            .map(|(_, v)| v.external.instantaneous_bytes_per_second)
            .sum();
        let channels: u64 = self
            .channels
            .iter()
            .map(|c| c.vote.instantaneous_bytes_per_second)
            .sum();
        instances + channels
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    /// Bandwidth accounting is turned off; nothing is emitted
    Disabled,
    Votes(VoteSet),
}

impl VoteOutcome {
    pub fn votes(&self) -> Option<&VoteSet> {
        match self {
            VoteOutcome::Votes(votes) => Some(votes),
            VoteOutcome::Disabled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockVote {
    /// `None` for instances that run no pixel processing
    pub pixel_clock_hz: StripeSlots<Option<u64>>,
    pub auxiliary_channel_clock_hz: Vec<(OutputPort, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockOutcome {
    Disabled,
    Votes(ClockVote),
}

impl ClockOutcome {
    pub fn votes(&self) -> Option<&ClockVote> {
        match self {
            ClockOutcome::Votes(votes) => Some(votes),
            ClockOutcome::Disabled => None,
        }
    }
}
