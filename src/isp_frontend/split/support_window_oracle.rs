//! Reference geometry oracle.
//!
//! Sizes the overlap band from the summed horizontal support of the enabled
//! filters and widens the left stripe so that no statistics region straddles
//! the split. It does not attempt any per-filter range algebra beyond that.

use tracing::debug;

use crate::isp_frontend::common::error::{FrontendError, Result};
use crate::isp_frontend::common::geometry::Rect;
use crate::isp_frontend::split::oracle::{
    GeometryOracle, OracleInput, OracleOutput, OraclePathRange, OracleStatsSplit, OracleStripe,
    OverlapBand, StripeEdge,
};
use crate::isp_frontend::stripe::types::StatsEngineConfig;

#[derive(Debug, Clone)]
pub struct SupportWindowOracle {
    /// Lower bound on the per-side padding
    pub min_padding: u32,
    /// Padding granularity in pixels
    pub alignment: u32,
}

impl Default for SupportWindowOracle {
    fn default() -> Self {
        Self {
            min_padding: 16,
            alignment: 2,
        }
    }
}

struct GridSplit<'a> {
    config: &'a StatsEngineConfig,
    region_width: u32,
    left_regions: u32,
}

impl SupportWindowOracle {
    fn padding(&self, input: &OracleInput<'_>) -> u32 {
        let support: u32 = input.filters.iter().map(|f| f.horizontal_support).sum();
        let align = self.alignment.max(1);
        support.max(self.min_padding).div_ceil(align) * align
    }

    fn split_grid<'a>(config: &'a StatsEngineConfig, frame_width: u32, split: u32) -> Result<GridSplit<'a>> {
        let n = config.horizontal_regions;
        if n == 0 || config.roi.width < n || config.roi.right() > frame_width {
            return Err(FrontendError::oracle(format!(
                "{:?} grid of {} regions over {:?} is infeasible",
                config.engine, n, config.roi
            )));
        }
        let region_width = config.roi.width / n;
        // Every region that starts left of the split belongs to the left stripe
        let left_regions = if split <= config.roi.x {
            0
        } else {
            (split - config.roi.x).div_ceil(region_width).min(n)
        };
        Ok(GridSplit {
            config,
            region_width,
            left_regions,
        })
    }
}

impl GeometryOracle for SupportWindowOracle {
    fn solve(&self, input: &OracleInput<'_>) -> Result<OracleOutput> {
        let width = input.frame_width;
        let mid = width / 2;
        let pad = self.padding(input);
        if pad >= mid {
            return Err(FrontendError::oracle(format!(
                "padding {pad} does not fit a {width} pixel frame"
            )));
        }
        let right_start = mid - pad;
        let mut left_end = mid + pad - 1;

        let mut grids = Vec::with_capacity(input.stats.len());
        for config in input.stats {
            let grid = Self::split_grid(config, width, mid)?;
            if grid.left_regions > 0 {
                let reach = config.roi.x + grid.left_regions * grid.region_width;
                left_end = left_end.max(reach - 1);
            }
            grids.push(grid);
        }
        if left_end >= width {
            return Err(FrontendError::oracle("left stripe runs past the frame"));
        }

        let mut left = OracleStripe {
            edge: StripeEdge::Left,
            first_pixel: 0,
            last_pixel: left_end,
            paths: Vec::with_capacity(input.paths.len()),
            stats: Vec::with_capacity(grids.len()),
        };
        let mut right = OracleStripe {
            edge: StripeEdge::Right,
            first_pixel: right_start,
            last_pixel: width - 1,
            paths: Vec::with_capacity(input.paths.len()),
            stats: Vec::with_capacity(grids.len()),
        };

        for path in input.paths {
            let left_out = (path.width as u64 * mid as u64 / width as u64) as u32 & !1;
            if left_out == 0 || left_out >= path.width {
                return Err(FrontendError::oracle(format!(
                    "{:?} output of {} pixels cannot be split",
                    path.port, path.width
                )));
            }
            left.paths.push(OraclePathRange {
                port: path.port,
                first_input: 0,
                last_input: mid - 1,
                first_output: 0,
                last_output: left_out - 1,
            });
            right.paths.push(OraclePathRange {
                port: path.port,
                first_input: mid - right_start,
                last_input: width - 1 - right_start,
                first_output: left_out,
                last_output: path.width - 1,
            });
        }

        for grid in grids {
            let roi = grid.config.roi;
            let left_width = grid.left_regions * grid.region_width;
            let right_regions = grid.config.horizontal_regions - grid.left_regions;
            let boundary = roi.x + left_width;

            left.stats.push(OracleStatsSplit {
                engine: grid.config.engine,
                horizontal_regions: grid.left_regions,
                vertical_regions: grid.config.vertical_regions,
                roi: Rect::new(roi.x, roi.y, left_width, roi.height),
            });
            let right_roi = if right_regions == 0 {
                Rect::new(0, roi.y, 0, roi.height)
            } else {
                Rect::new(boundary - right_start, roi.y, roi.width - left_width, roi.height)
            };
            right.stats.push(OracleStatsSplit {
                engine: grid.config.engine,
                horizontal_regions: right_regions,
                vertical_regions: grid.config.vertical_regions,
                roi: right_roi,
            });
        }

        debug!(pad, right_start, left_end, "Support window solved");
        Ok(OracleOutput::new(
            OverlapBand {
                right_stripe_start: right_start as i64,
                left_stripe_end: left_end as i64,
            },
            vec![left, right],
        ))
    }
}
