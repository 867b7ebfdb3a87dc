//! Frame and stripe configuration types

use serde::{Deserialize, Serialize};

use crate::isp_frontend::common::geometry::{Rect, StripeId, StripeSlots};
use crate::isp_frontend::split::{PipelineMode, SplitParameters};
use crate::isp_frontend::stripe::format::{FormatId, TransportWidth};

/// Hardware output ports of the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputPort {
    Full,
    Display,
    FaceDetect,
    Ds4,
    Ds16,
    PixelRaw,
    Rdi0,
    Rdi1,
    Rdi2,
    Pdaf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Produced by the pixel-processing path and split across stripes
    Pixel,
    /// Raw pass-through channel, never split
    Auxiliary,
}

impl OutputPort {
    pub fn kind(self) -> PortKind {
        match self {
            OutputPort::Rdi0 | OutputPort::Rdi1 | OutputPort::Rdi2 | OutputPort::Pdaf => {
                PortKind::Auxiliary
            }
            _ => PortKind::Pixel,
        }
    }
}

/// Fixed-grid statistics accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatsEngine {
    HdrBe,
    AwbBg,
    Bf,
    Rs,
    Cs,
    Ihist,
    Bhist,
    Tintless,
}

/// Pixel-path filter modules relevant to stripe geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterModule {
    Bpc,
    Abf,
    Demosaic,
    Lsc,
    Gamma,
    Sharpen,
    MainScaler,
    Ds4Scaler,
    Ds16Scaler,
    FdScaler,
}

impl FilterModule {
    /// Modules whose programming depends on the bank they used last frame.
    pub fn is_stateful(self) -> bool {
        matches!(self, FilterModule::Lsc | FilterModule::Gamma)
    }
}

/// Horizontal spatial support an enabled filter needs on each side of a
/// column to produce bit-exact output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequirement {
    pub module: FilterModule,
    pub horizontal_support: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    pub port: OutputPort,
    pub width: u32,
    pub height: u32,
    pub format: FormatId,
    /// Path runs at `1 / frame_rate_divisor` of the sensor rate
    #[serde(default = "default_divisor")]
    pub frame_rate_divisor: u32,
}

fn default_divisor() -> u32 {
    1
}

impl PathConfig {
    pub fn new(port: OutputPort, width: u32, height: u32, format: FormatId) -> Self {
        Self {
            port,
            width,
            height,
            format,
            frame_rate_divisor: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsEngineConfig {
    pub engine: StatsEngine,
    /// Region grid origin and extent in CAMIF coordinates
    pub roi: Rect,
    pub horizontal_regions: u32,
    pub vertical_regions: u32,
}

/// Raw or auxiliary channel written straight from the sensor stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxChannelConfig {
    pub port: OutputPort,
    pub format: FormatId,
    /// Native channel geometry when smaller than the main sensor region
    #[serde(default)]
    pub native_size: Option<(u32, u32)>,
}

/// Unsplit configuration of one frame as negotiated by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullFrameConfig {
    /// Input crop applied at the hardware input, in sensor coordinates
    pub camif_crop: Rect,
    /// Per-frame zoom crop, in CAMIF coordinates
    pub hal_crop: Rect,
    pub paths: Vec<PathConfig>,
    #[serde(default)]
    pub stats: Vec<StatsEngineConfig>,
    #[serde(default)]
    pub aux_channels: Vec<AuxChannelConfig>,
    #[serde(default)]
    pub filters: Vec<FilterRequirement>,
}

impl FullFrameConfig {
    pub fn total_width(&self) -> u32 {
        self.camif_crop.width
    }

    pub fn path(&self, port: OutputPort) -> Option<&PathConfig> {
        self.paths.iter().find(|p| p.port == port)
    }

    pub fn ports(&self) -> impl Iterator<Item = OutputPort> + '_ {
        self.paths
            .iter()
            .map(|p| p.port)
            .chain(self.aux_channels.iter().map(|a| a.port))
    }
}

/// Geometry of one output path inside one stripe.
#[derive(Debug, Clone, PartialEq)]
pub struct PathGeometry {
    pub port: OutputPort,
    pub format: FormatId,
    /// First contributing input column, relative to the stripe crop origin
    pub input_offset: u32,
    /// Input columns this stripe owns for the path
    pub input_width: u32,
    /// First output column in the path's full output frame
    pub output_offset: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub transport: TransportWidth,
    /// Byte offset of this stripe's first write within an output line
    pub buffer_offset_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsRegionSplit {
    pub engine: StatsEngine,
    pub horizontal_regions: u32,
    pub vertical_regions: u32,
    /// Relative to the owning stripe's crop origin
    pub roi: Rect,
}

/// Configuration handed to one hardware instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StripeRecord {
    pub id: StripeId,
    /// Input columns processed by the instance, in CAMIF coordinates
    pub crop_window: Rect,
    pub paths: Vec<PathGeometry>,
    pub stats: Vec<StatsRegionSplit>,
    /// HAL crop projected onto the columns this stripe owns, stripe-local
    pub hal_crop: Rect,
    /// Table bank selection of stateful modules
    pub module_banks: Vec<(FilterModule, u8)>,
}

impl StripeRecord {
    pub fn path(&self, port: OutputPort) -> Option<&PathGeometry> {
        self.paths.iter().find(|p| p.port == port)
    }

    pub fn stats(&self, engine: StatsEngine) -> Option<&StatsRegionSplit> {
        self.stats.iter().find(|s| s.engine == engine)
    }
}

/// Result of distributing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StripeSet {
    pub mode: PipelineMode,
    pub split: Option<SplitParameters>,
    pub records: StripeSlots<Option<StripeRecord>>,
}

impl StripeSet {
    /// Records that are programmed into a hardware instance: left and right
    /// in dual mode, the common record in single mode.
    pub fn instances(&self) -> Vec<&StripeRecord> {
        let ids: &[StripeId] = match self.mode {
            PipelineMode::Dual => &StripeId::INSTANCES,
            PipelineMode::Single => &[StripeId::Common],
        };
        ids.iter()
            .filter_map(|id| self.records[*id].as_ref())
            .collect()
    }

    pub fn record(&self, id: StripeId) -> Option<&StripeRecord> {
        self.records[id].as_ref()
    }
}
