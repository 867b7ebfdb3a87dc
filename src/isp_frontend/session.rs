//! Session orchestration
//!
//! Ties sensor timing, the split decision, stripe distribution and resource
//! votes into a finalize step and a per-request step.

use tracing::{debug, info, info_span, instrument, warn};

use crate::isp_frontend::bandwidth::{BandwidthModel, ClockModel, ClockOutcome, VoteOutcome};
use crate::isp_frontend::common::error::{FrontendError, Result};
use crate::isp_frontend::common::geometry::Rect;
use crate::isp_frontend::config::FrontendConfig;
use crate::isp_frontend::sensor::{SensorGeometry, SensorTimingModel};
use crate::isp_frontend::split::{
    GeometryOracle, ModeDecision, ModeInputs, OracleOutput, PipelineMode, SplitGeometrySolver,
    SplitParameters, SupportWindowOracle,
};
use crate::isp_frontend::stripe::{
    FilterModule, FormatTable, FullFrameConfig, ModuleHistory, OutputPort, StripeConfigDistributor,
    StripeSet,
};


/// Per-frame state of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRequest {
    /// Zoom crop for this frame; `None` keeps the previous one
    pub hal_crop: Option<Rect>,
    /// Ports written this request; empty means every configured port
    pub enabled_ports: Vec<OutputPort>,
    /// Stateful modules whose tables are reprogrammed this frame
    pub reprogrammed_modules: Vec<FilterModule>,
}

/// Everything handed off for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    pub request_id: u64,
    pub stripes: StripeSet,
    pub bandwidth: VoteOutcome,
    pub clock: ClockOutcome,
}

/// Session state fixed at finalize.
#[derive(Debug, Clone)]
struct SessionLayout {
    frame: FullFrameConfig,
    mode: PipelineMode,
    split: Option<SplitParameters>,
    oracle_output: Option<OracleOutput>,
    clock: ClockOutcome,
}

#[derive(Debug, Clone)]
struct StripeCache {
    hal_crop: Rect,
    history_generation: u64,
    stripes: StripeSet,
}

pub struct FrontendSession<O: GeometryOracle> {
    oracle: O,
    config: FrontendConfig,
    formats: FormatTable,
    timing: SensorTimingModel,
    mode: ModeDecision,
    layout: Option<SessionLayout>,
    history: ModuleHistory,
    cache: Option<StripeCache>,
    request_count: u64,
}

impl FrontendSession<SupportWindowOracle> {
    pub fn new(config: FrontendConfig, sensor: SensorGeometry) -> Result<Self> {
        Self::with_custom(SupportWindowOracle::default(), config, sensor, FormatTable::standard())
    }
}

impl<O: GeometryOracle> FrontendSession<O> {
    pub fn with_custom(
        oracle: O,
        config: FrontendConfig,
        sensor: SensorGeometry,
        formats: FormatTable,
    ) -> Result<Self> {
        sensor.validate()?;
        let timing = SensorTimingModel::new(
            sensor,
            config.capabilities.burst_alignment,
            config.capabilities.min_vertical_blanking_floor,
        );
        Ok(Self {
            oracle,
            config,
            formats,
            timing,
            mode: ModeDecision::default(),
            layout: None,
            history: ModuleHistory::new(),
            cache: None,
            request_count: 0,
        })
    }

    fn validate_frame(&self, frame: &FullFrameConfig) -> Result<()> {
        let sensor = self.timing.geometry();
        let crop = frame.camif_crop;
        if crop.is_empty() || crop.right() > sensor.output_width || crop.bottom() > sensor.output_height {
            return Err(FrontendError::invalid(format!(
                "CAMIF crop {crop:?} outside {}x{} sensor",
                sensor.output_width, sensor.output_height
            )));
        }
        if frame.paths.is_empty() && frame.aux_channels.is_empty() {
            return Err(FrontendError::invalid("no output ports configured"));
        }
        Ok(())
    }

    /// Decides the pipeline mode and split for the session.
    ///
    /// The mode is terminal: finalizing again reuses it and only refreshes the
    /// frame layout. Table banks of modules still enabled carry over. A failed
    /// finalize leaves the session as it was.
    #[instrument(skip(self, frame), fields(paths = frame.paths.len()))]
    pub fn finalize(&mut self, frame: FullFrameConfig, camera_sharing_active: bool) -> Result<PipelineMode> {
        self.validate_frame(&frame)?;
        // Nothing below touches the session until distribution has succeeded
        let timing = self.timing.clone().with_pixel_path(!frame.paths.is_empty());

        let required_clock_hz = timing.required_pixel_clock(frame.total_width());
        let capabilities = &self.config.capabilities;
        let dual = &self.config.dual;
        let inputs = ModeInputs {
            required_clock_hz,
            max_instance_clock_hz: capabilities.max_instance_clock_hz,
            dual_threshold_hz: dual.dual_clock_threshold_hz,
            dual_enabled: dual.enabled,
            force_dual: dual.force_dual,
            force_single: dual.force_single,
            camera_sharing_active,
            path_widths: frame
                .paths
                .iter()
                .map(|p| (p.port, p.width, capabilities.max_path_width(p.port)))
                .collect(),
        };
        let mut decision = self.mode;
        let mode = decision.decide(&inputs);

        let (split, oracle_output) = match mode {
            PipelineMode::Single => (None, None),
            PipelineMode::Dual => {
                let solution = SplitGeometrySolver::new(&self.oracle, dual.split_override)
                    .compute_split_parameters(&frame)?;
                (Some(solution.params), solution.oracle_output)
            }
        };

        let history = self.history.retrack(frame.filters.iter().map(|f| f.module));
        let stripes = {
            let _span = info_span!("distribute_finalize").entered();
            StripeConfigDistributor::new(&self.formats).distribute(
                mode,
                split.as_ref(),
                &frame,
                oracle_output.as_ref(),
                &history,
            )?
        };
        let clock = ClockModel::new(&self.config.clock, &self.config.capabilities, &timing)
            .compute(&stripes, &frame);

        info!(
            ?mode,
            required_clock_hz,
            split_point = ?split.map(|s| s.split_point),
            "Session finalized"
        );
        self.mode = decision;
        self.timing = timing;
        self.history = history;
        self.cache = Some(StripeCache {
            hal_crop: frame.hal_crop,
            history_generation: self.history.generation(),
            stripes,
        });
        self.layout = Some(SessionLayout {
            frame,
            mode,
            split,
            oracle_output,
            clock,
        });
        Ok(mode)
    }

    /// Plans one request. Nothing is handed off unless every stage succeeds.
    #[instrument(skip(self, request), fields(request_id = self.request_count))]
    pub fn process_request(&mut self, request: &FrameRequest) -> Result<RequestPlan> {
        let layout = self
            .layout
            .as_mut()
            .ok_or_else(|| FrontendError::invalid("request before session finalize"))?;

        // Work on copies so a failed request leaves the session untouched
        let mut history = self.history.clone();
        history.advance(&request.reprogrammed_modules);
        let mut frame = layout.frame.clone();
        if let Some(hal_crop) = request.hal_crop {
            let crop = frame.camif_crop;
            if hal_crop.is_empty() || hal_crop.right() > crop.width || hal_crop.bottom() > crop.height {
                return Err(FrontendError::invalid(format!(
                    "HAL crop {hal_crop:?} outside {}x{} CAMIF output",
                    crop.width, crop.height
                )));
            }
            frame.hal_crop = hal_crop;
        }

        let cached = self.cache.as_ref().filter(|c| {
            c.hal_crop == frame.hal_crop && c.history_generation == history.generation()
        });
        let stripes = match cached {
            Some(cache) => {
                debug!("Reusing stripe records");
                cache.stripes.clone()
            }
            None => {
                let _span = info_span!("distribute").entered();
                StripeConfigDistributor::new(&self.formats).distribute(
                    layout.mode,
                    layout.split.as_ref(),
                    &frame,
                    layout.oracle_output.as_ref(),
                    &history,
                )?
            }
        };

        let enabled_ports: Vec<OutputPort> = if request.enabled_ports.is_empty() {
            frame.ports().collect()
        } else {
            request.enabled_ports.clone()
        };
        let startup_counter = u32::try_from(self.request_count).unwrap_or(u32::MAX);
        let bandwidth = {
            let _span = info_span!("bandwidth_votes").entered();
            BandwidthModel::new(&self.config.bandwidth, &self.formats, &self.timing).compute_votes(
                &stripes,
                &frame,
                &enabled_ports,
                startup_counter,
            )?
        };
        if bandwidth == VoteOutcome::Disabled {
            debug!("Skipping bandwidth emission");
        }

        let request_id = self.request_count;
        self.request_count += 1;
        self.history = history;
        layout.frame = frame;
        self.cache = Some(StripeCache {
            hal_crop: layout.frame.hal_crop,
            history_generation: self.history.generation(),
            stripes: stripes.clone(),
        });

        Ok(RequestPlan {
            request_id,
            stripes,
            bandwidth,
            clock: layout.clock.clone(),
        })
    }

    pub fn mode(&self) -> Option<PipelineMode> {
        self.mode.mode()
    }

    pub fn split(&self) -> Option<SplitParameters> {
        self.layout.as_ref().and_then(|l| l.split)
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    pub fn timing(&self) -> &SensorTimingModel {
        &self.timing
    }

    pub fn history(&self) -> &ModuleHistory {
        &self.history
    }

    pub fn requests_processed(&self) -> u64 {
        self.request_count
    }

    /// Drops the finalized layout; the mode decision stays.
    pub fn reset_layout(&mut self) {
        if self.layout.take().is_some() {
            warn!("Session layout cleared, finalize again before the next request");
        }
        self.cache = None;
    }
}
