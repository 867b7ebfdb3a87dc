use tracing::debug;

use crate::isp_frontend::bandwidth::types::{ClockOutcome, ClockVote};
use crate::isp_frontend::common::geometry::StripeSlots;
use crate::isp_frontend::config::types::{CapabilityTable, ClockConfig};
use crate::isp_frontend::sensor::SensorTimingModel;
use crate::isp_frontend::stripe::types::{FullFrameConfig, StripeSet};

pub struct ClockModel<'a> {
    config: &'a ClockConfig,
    capabilities: &'a CapabilityTable,
    timing: &'a SensorTimingModel,
}

impl<'a> ClockModel<'a> {
    pub fn new(config: &'a ClockConfig, capabilities: &'a CapabilityTable, timing: &'a SensorTimingModel) -> Self {
        Self {
            config,
            capabilities,
            timing,
        }
    }

    /// Per-instance pixel clock: the clock its stripe width needs, raised to
    /// the platform minimum. Pass-through instances get no pixel clock.
    pub fn compute(&self, stripes: &StripeSet, frame: &FullFrameConfig) -> ClockOutcome {
        if !self.config.enabled {
            return ClockOutcome::Disabled;
        }

        let mut pixel_clock_hz = StripeSlots::empty();
        for record in stripes.instances() {
            pixel_clock_hz[record.id] = match self.config.fixed_clock_hz {
                Some(fixed) => Some(fixed),
                None => match self.timing.required_pixel_clock(record.crop_window.width) {
                    0 => None,
                    required => Some(required.max(self.capabilities.platform_min_clock_hz)),
                },
            };
        }

        let channel_clock = self
            .config
            .fixed_clock_hz
            .unwrap_or(self.timing.geometry().output_pixel_clock);
        let auxiliary_channel_clock_hz = frame
            .aux_channels
            .iter()
            .map(|aux| (aux.port, channel_clock))
            .collect();

        let vote = ClockVote {
            pixel_clock_hz,
            auxiliary_channel_clock_hz,
        };
        debug!(?vote, "Clock vote computed");
        ClockOutcome::Votes(vote)
    }
}
