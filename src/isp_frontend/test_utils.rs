//! Shared fixtures for unit tests.

use crate::isp_frontend::common::geometry::Rect;
use crate::isp_frontend::sensor::SensorGeometry;
use crate::isp_frontend::stripe::{
    AuxChannelConfig, FilterModule, FilterRequirement, FormatId, FullFrameConfig, OutputPort,
    PathConfig, StatsEngine, StatsEngineConfig,
};

pub(crate) const WIDTH: u32 = 4208;
pub(crate) const HEIGHT: u32 = 3120;

pub(crate) fn sensor_4208() -> SensorGeometry {
    SensorGeometry {
        output_width: WIDTH,
        output_height: HEIGHT,
        min_horizontal_blanking: 64,
        min_vertical_blanking: 16,
        output_pixel_clock: 600_000_000,
        max_frame_rate: 30.0,
        num_lines_per_frame: HEIGHT + 16,
    }
}

pub(crate) fn stats_grid(engine: StatsEngine, roi: Rect, h: u32, v: u32) -> StatsEngineConfig {
    StatsEngineConfig {
        engine,
        roi,
        horizontal_regions: h,
        vertical_regions: v,
    }
}

/// Full-resolution, display and face-detect outputs with three stats grids,
/// each with a region boundary on the midpoint column.
pub(crate) fn frame_4208() -> FullFrameConfig {
    FullFrameConfig {
        camif_crop: Rect::new(0, 0, WIDTH, HEIGHT),
        hal_crop: Rect::new(0, 0, WIDTH, HEIGHT),
        paths: vec![
            PathConfig::new(OutputPort::Full, WIDTH, HEIGHT, FormatId::UbwcTp10),
            PathConfig::new(OutputPort::Display, 1920, 1080, FormatId::UbwcNv12),
            PathConfig::new(OutputPort::FaceDetect, 640, 480, FormatId::Nv12),
        ],
        stats: vec![
            stats_grid(StatsEngine::HdrBe, Rect::new(24, 0, 4160, HEIGHT), 64, 48),
            stats_grid(StatsEngine::AwbBg, Rect::new(8, 0, 4192, HEIGHT), 32, 24),
            stats_grid(StatsEngine::Bf, Rect::new(1104, 500, 2000, 1000), 10, 5),
        ],
        aux_channels: vec![AuxChannelConfig {
            port: OutputPort::Rdi0,
            format: FormatId::Mipi10,
            native_size: None,
        }],
        filters: vec![
            FilterRequirement { module: FilterModule::Demosaic, horizontal_support: 4 },
            FilterRequirement { module: FilterModule::Abf, horizontal_support: 8 },
            FilterRequirement { module: FilterModule::Sharpen, horizontal_support: 6 },
            FilterRequirement { module: FilterModule::MainScaler, horizontal_support: 8 },
            FilterRequirement { module: FilterModule::Lsc, horizontal_support: 0 },
        ],
    }
}
