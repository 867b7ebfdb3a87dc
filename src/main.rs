use anyhow::Context;
use isp_frontend_rs::isp_frontend::{
    AuxChannelConfig, FilterModule, FilterRequirement, FormatId, FrameRequest, FrontendConfig,
    FrontendSession, FullFrameConfig, OutputPort, PathConfig, Rect, SensorGeometry, StatsEngine,
    StatsEngineConfig, StripeId,
};
use isp_frontend_rs::logger;

use tracing::{info, warn};

fn demo_sensor() -> SensorGeometry {
    SensorGeometry {
        output_width: 4208,
        output_height: 3120,
        min_horizontal_blanking: 64,
        min_vertical_blanking: 16,
        output_pixel_clock: 600_000_000,
        max_frame_rate: 30.0,
        num_lines_per_frame: 3136,
    }
}

fn demo_frame() -> FullFrameConfig {
    let full = Rect::new(0, 0, 4208, 3120);
    FullFrameConfig {
        camif_crop: full,
        hal_crop: full,
        paths: vec![
            PathConfig::new(OutputPort::Full, 4208, 3120, FormatId::UbwcTp10),
            PathConfig::new(OutputPort::Display, 1920, 1080, FormatId::UbwcNv12),
        ],
        stats: vec![StatsEngineConfig {
            engine: StatsEngine::HdrBe,
            roi: Rect::new(24, 0, 4160, 3120),
            horizontal_regions: 64,
            vertical_regions: 48,
        }],
        aux_channels: vec![AuxChannelConfig {
            port: OutputPort::Rdi0,
            format: FormatId::Mipi10,
            native_size: None,
        }],
        filters: vec![
            FilterRequirement {
                module: FilterModule::Demosaic,
                horizontal_support: 4,
            },
            FilterRequirement {
                module: FilterModule::Sharpen,
                horizontal_support: 6,
            },
            FilterRequirement {
                module: FilterModule::Lsc,
                horizontal_support: 0,
            },
        ],
    }
}

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting isp_frontend...");

    let config = match std::env::args().nth(1) {
        Some(path) => FrontendConfig::from_json_file(&path)
            .with_context(|| format!("loading front-end config from {path}"))?,
        None => FrontendConfig::default(),
    };

    let mut session = FrontendSession::new(config, demo_sensor())?;
    let mode = session.finalize(demo_frame(), false)?;
    info!("Pipeline mode: {:?}", mode);
    if let Some(split) = session.split() {
        info!(
            "Split at column {} (padding {}/{})",
            split.split_point, split.left_padding, split.right_padding
        );
    }

    for zoom in [0u32, 400, 800] {
        let request = FrameRequest {
            hal_crop: Some(Rect::new(zoom, zoom / 2, 4208 - 2 * zoom, 3120 - zoom)),
            enabled_ports: Vec::new(),
            reprogrammed_modules: vec![FilterModule::Lsc],
        };
        let plan = session
            .process_request(&request)
            .with_context(|| format!("planning request with zoom {zoom}"))?;

        for record in plan.stripes.instances() {
            info!("{:?} stripe crop: {:?}", record.id, record.crop_window);
        }
        match plan.bandwidth.votes() {
            Some(votes) => info!(
                "Request {}: {} B/s instantaneous",
                plan.request_id,
                votes.total_instantaneous()
            ),
            None => warn!("Bandwidth accounting disabled"),
        }
        if let Some(clock) = plan.clock.votes() {
            for id in [StripeId::Left, StripeId::Right, StripeId::Common] {
                if let Some(hz) = clock.pixel_clock_hz[id] {
                    info!("{:?} pixel clock: {} Hz", id, hz);
                }
            }
        }
    }

    Ok(())
}
