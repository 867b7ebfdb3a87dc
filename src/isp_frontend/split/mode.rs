//! Single/dual mode decision
//!
//! The decision is an ordered table of rules; the first rule whose predicate
//! holds picks the mode.

use tracing::{debug, info, warn};

use crate::isp_frontend::split::types::PipelineMode;
use crate::isp_frontend::stripe::types::OutputPort;

/// Everything the mode decision looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeInputs {
    pub required_clock_hz: u64,
    pub max_instance_clock_hz: u64,
    pub dual_threshold_hz: u64,
    pub dual_enabled: bool,
    pub force_dual: bool,
    pub force_single: bool,
    /// Another camera session shares the front-end hardware
    pub camera_sharing_active: bool,
    /// Enabled output paths with their width and single-instance maximum
    pub path_widths: Vec<(OutputPort, u32, Option<u32>)>,
}

impl ModeInputs {
    fn fits_one_instance(&self) -> bool {
        self.required_clock_hz <= self.max_instance_clock_hz
    }

    fn path_exceeds_single_limit(&self) -> bool {
        self.path_widths
            .iter()
            .any(|(_, width, max)| max.is_some_and(|max| *width > max))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModeRule {
    pub name: &'static str,
    pub applies: fn(&ModeInputs) -> bool,
    pub mode: PipelineMode,
}

pub const MODE_RULES: &[ModeRule] = &[
    ModeRule {
        name: "dual_disabled",
        applies: |i| !i.dual_enabled,
        mode: PipelineMode::Single,
    },
    ModeRule {
        name: "force_dual",
        applies: |i| i.force_dual,
        mode: PipelineMode::Dual,
    },
    ModeRule {
        name: "sharing_fits_single",
        applies: |i| i.camera_sharing_active && i.fits_one_instance(),
        mode: PipelineMode::Single,
    },
    ModeRule {
        name: "sharing_needs_dual",
        applies: |i| i.camera_sharing_active,
        mode: PipelineMode::Dual,
    },
    ModeRule {
        name: "force_single",
        applies: |i| i.force_single && i.fits_one_instance(),
        mode: PipelineMode::Single,
    },
    ModeRule {
        name: "clock_above_threshold",
        applies: |i| i.required_clock_hz > i.dual_threshold_hz,
        mode: PipelineMode::Dual,
    },
    ModeRule {
        name: "path_too_wide",
        applies: ModeInputs::path_exceeds_single_limit,
        mode: PipelineMode::Dual,
    },
    ModeRule {
        name: "default",
        applies: |_| true,
        mode: PipelineMode::Single,
    },
];

/// First matching rule of `rules`, falling back to single mode.
pub fn evaluate_rules(rules: &[ModeRule], inputs: &ModeInputs) -> (PipelineMode, &'static str) {
    rules
        .iter()
        .find(|rule| (rule.applies)(inputs))
        .map(|rule| (rule.mode, rule.name))
        .unwrap_or((PipelineMode::Single, "no_rule"))
}

pub fn evaluate_mode(inputs: &ModeInputs) -> PipelineMode {
    evaluate_rules(MODE_RULES, inputs).0
}

/// Session mode, decided once and terminal afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeDecision {
    #[default]
    Undetermined,
    Decided(PipelineMode),
}

impl ModeDecision {
    /// Evaluates the rules on first call; later calls return the existing
    /// decision unchanged.
    pub fn decide(&mut self, inputs: &ModeInputs) -> PipelineMode {
        match *self {
            ModeDecision::Decided(mode) => {
                let fresh = evaluate_mode(inputs);
                if fresh != mode {
                    warn!(?mode, ?fresh, "Ignoring mode change after session finalize");
                } else {
                    debug!(?mode, "Mode already decided");
                }
                mode
            }
            ModeDecision::Undetermined => {
                let (mode, rule) = evaluate_rules(MODE_RULES, inputs);
                info!(
                    ?mode,
                    rule,
                    required_clock_hz = inputs.required_clock_hz,
                    "Pipeline mode decided"
                );
                *self = ModeDecision::Decided(mode);
                mode
            }
        }
    }

    pub fn mode(&self) -> Option<PipelineMode> {
        match self {
            ModeDecision::Decided(mode) => Some(*mode),
            ModeDecision::Undetermined => None,
        }
    }
}
