use tracing::{debug, instrument};

use crate::isp_frontend::common::error::{FrontendError, Result, try_with_capacity};
use crate::isp_frontend::common::geometry::{Rect, StripeId, StripeSlots};
use crate::isp_frontend::split::{OracleOutput, OracleStripe, PipelineMode, SplitParameters, StripeEdge};
use crate::isp_frontend::stripe::format::FormatTable;
use crate::isp_frontend::stripe::history::ModuleHistory;
use crate::isp_frontend::stripe::types::{
    FullFrameConfig, PathConfig, PathGeometry, StatsEngineConfig, StatsRegionSplit, StripeRecord,
    StripeSet,
};

/// Splits a statistics grid at `split_point` by the share of the ROI left of
/// the split. The left count is floored and the right stripe gets the rest.
pub fn split_region_count(regions: u32, roi: &Rect, split_point: u32) -> (u32, u32) {
    if roi.width == 0 {
        return (0, regions);
    }
    let owned = split_point.saturating_sub(roi.x).min(roi.width);
    let left = (regions as u64 * owned as u64 / roi.width as u64) as u32;
    (left, regions - left)
}

/// Builds per-instance records for one frame.
pub struct StripeConfigDistributor<'a> {
    formats: &'a FormatTable,
}

impl<'a> StripeConfigDistributor<'a> {
    pub fn new(formats: &'a FormatTable) -> Self {
        Self { formats }
    }

    /// Distributes `frame` over the instances of `mode`.
    ///
    /// In dual mode the records are mapped from `oracle` when present and
    /// derived proportionally from `split` otherwise.
    #[instrument(skip_all, fields(mode = ?mode, computed = oracle.is_some()))]
    pub fn distribute(
        &self,
        mode: PipelineMode,
        split: Option<&SplitParameters>,
        frame: &FullFrameConfig,
        oracle: Option<&OracleOutput>,
        history: &ModuleHistory,
    ) -> Result<StripeSet> {
        if frame.paths.is_empty() && frame.aux_channels.is_empty() {
            return Err(FrontendError::invalid("no output ports configured"));
        }
        for path in &frame.paths {
            self.formats.get(path.format)?;
        }

        let mut records = StripeSlots::empty();
        records[StripeId::Common] = Some(self.common_record(frame, history)?);

        let split = match mode {
            PipelineMode::Single => None,
            PipelineMode::Dual => {
                let split = split
                    .copied()
                    .ok_or_else(|| FrontendError::invalid("dual mode without split parameters"))?;
                if split.total_width != frame.total_width() {
                    return Err(FrontendError::invalid(format!(
                        "split computed for width {} applied to width {}",
                        split.total_width,
                        frame.total_width()
                    )));
                }
                validate_split(&split)?;
                let [left, right] = match oracle {
                    Some(output) => self.from_oracle(&split, frame, output, history)?,
                    None => self.proportional(&split, frame, history)?,
                };
                records[StripeId::Left] = Some(left);
                records[StripeId::Right] = Some(right);
                Some(split)
            }
        };

        Ok(StripeSet {
            mode,
            split,
            records,
        })
    }

    fn path_geometry(
        &self,
        path: &PathConfig,
        input: (u32, u32),
        output: (u32, u32),
    ) -> Result<PathGeometry> {
        let (input_offset, input_width) = input;
        let (output_offset, output_width) = output;
        if input_width == 0 || output_width == 0 || path.height == 0 {
            return Err(FrontendError::invalid(format!(
                "non-positive stripe width for {:?}: input {input_width}, output {output_width}",
                path.port
            )));
        }
        let descriptor = self.formats.get(path.format)?;
        Ok(PathGeometry {
            port: path.port,
            format: path.format,
            input_offset,
            input_width,
            output_offset,
            output_width,
            output_height: path.height,
            transport: descriptor.transport_width(output_offset, output_width),
            buffer_offset_bytes: descriptor.byte_offset(output_offset),
        })
    }

    fn common_record(&self, frame: &FullFrameConfig, history: &ModuleHistory) -> Result<StripeRecord> {
        let total = frame.total_width();
        let crop_window = Rect::new(0, 0, total, frame.camif_crop.height);
        if crop_window.is_empty() {
            return Err(FrontendError::invalid("empty CAMIF crop"));
        }

        let mut paths = try_with_capacity(frame.paths.len(), "common path records")?;
        for path in &frame.paths {
            paths.push(self.path_geometry(path, (0, total), (0, path.width))?);
        }
        let mut stats = try_with_capacity(frame.stats.len(), "common stats records")?;
        for config in &frame.stats {
            validate_grid(config, total)?;
            stats.push(StatsRegionSplit {
                engine: config.engine,
                horizontal_regions: config.horizontal_regions,
                vertical_regions: config.vertical_regions,
                roi: config.roi,
            });
        }

        Ok(StripeRecord {
            id: StripeId::Common,
            crop_window,
            paths,
            stats,
            hal_crop: frame.hal_crop.clip_columns(0, total),
            module_banks: history.snapshot(),
        })
    }

    fn proportional(
        &self,
        split: &SplitParameters,
        frame: &FullFrameConfig,
        history: &ModuleHistory,
    ) -> Result<[StripeRecord; 2]> {
        let total = split.total_width;
        let point = split.split_point;
        let height = frame.camif_crop.height;
        let left_crop = Rect::new(0, 0, split.left_stripe_width(), height);
        let right_crop = Rect::new(split.right_stripe_start(), 0, split.right_stripe_width(), height);

        let mut left_paths = try_with_capacity(frame.paths.len(), "left path records")?;
        let mut right_paths = try_with_capacity(frame.paths.len(), "right path records")?;
        for path in &frame.paths {
            let left_out = (path.width as u64 * point as u64 / total as u64) as u32 & !1;
            let right_out = path.width.saturating_sub(left_out);
            left_paths.push(self.path_geometry(path, (0, point), (0, left_out))?);
            right_paths.push(self.path_geometry(
                path,
                (split.left_padding, total - point),
                (left_out, right_out),
            )?);
        }

        let mut left_stats = try_with_capacity(frame.stats.len(), "left stats records")?;
        let mut right_stats = try_with_capacity(frame.stats.len(), "right stats records")?;
        for config in &frame.stats {
            validate_grid(config, total)?;
            let roi = config.roi;
            let pitch = roi.width / config.horizontal_regions;
            let (mut left_regions, mut right_regions) =
                split_region_count(config.horizontal_regions, &roi, point);
            let mut boundary = roi.x + left_regions * pitch;
            while right_regions > 0 && boundary < right_crop.x {
                // A region starting left of the right stripe goes to the left
                // stripe whole, or the grid cannot be split at all.
                if boundary + pitch > left_crop.right() {
                    return Err(FrontendError::invalid(format!(
                        "{:?} region [{boundary}, {}) straddles the {} pixel overlap at {point}",
                        config.engine,
                        boundary + pitch,
                        split.overlap()
                    )));
                }
                left_regions += 1;
                right_regions -= 1;
                boundary += pitch;
                debug!(engine = ?config.engine, boundary, "Moved straddling stats region left");
            }
            let left_width = left_regions * pitch;

            left_stats.push(StatsRegionSplit {
                engine: config.engine,
                horizontal_regions: left_regions,
                vertical_regions: config.vertical_regions,
                roi: Rect::new(roi.x, roi.y, left_width, roi.height),
            });

            let right_roi = if right_regions == 0 {
                Rect::new(0, roi.y, 0, roi.height)
            } else {
                Rect::new(boundary - right_crop.x, roi.y, roi.width - left_width, roi.height)
            };
            right_stats.push(StatsRegionSplit {
                engine: config.engine,
                horizontal_regions: right_regions,
                vertical_regions: config.vertical_regions,
                roi: right_roi,
            });
        }

        let left = StripeRecord {
            id: StripeId::Left,
            crop_window: left_crop,
            paths: left_paths,
            stats: left_stats,
            hal_crop: project_hal_crop(&frame.hal_crop, 0, point, left_crop.x),
            module_banks: history.snapshot(),
        };
        let right = StripeRecord {
            id: StripeId::Right,
            crop_window: right_crop,
            paths: right_paths,
            stats: right_stats,
            hal_crop: project_hal_crop(&frame.hal_crop, point, total, right_crop.x),
            module_banks: history.snapshot(),
        };
        Ok([left, right])
    }

    fn from_oracle(
        &self,
        split: &SplitParameters,
        frame: &FullFrameConfig,
        output: &OracleOutput,
        history: &ModuleHistory,
    ) -> Result<[StripeRecord; 2]> {
        let point = split.split_point;
        let left = self.map_oracle_stripe(
            StripeId::Left,
            output.stripe(StripeEdge::Left)?,
            frame,
            (0, point),
            history,
        )?;
        let right = self.map_oracle_stripe(
            StripeId::Right,
            output.stripe(StripeEdge::Right)?,
            frame,
            (point, split.total_width),
            history,
        )?;
        Ok([left, right])
    }

    fn map_oracle_stripe(
        &self,
        id: StripeId,
        stripe: &OracleStripe,
        frame: &FullFrameConfig,
        owned_columns: (u32, u32),
        history: &ModuleHistory,
    ) -> Result<StripeRecord> {
        if stripe.last_pixel < stripe.first_pixel || stripe.last_pixel >= frame.total_width() {
            return Err(FrontendError::invalid(format!(
                "non-positive stripe width for {id:?}: [{}, {}]",
                stripe.first_pixel, stripe.last_pixel
            )));
        }
        let crop_window = Rect::new(
            stripe.first_pixel,
            0,
            stripe.last_pixel - stripe.first_pixel + 1,
            frame.camif_crop.height,
        );

        let mut paths = try_with_capacity(frame.paths.len(), "oracle path records")?;
        for path in &frame.paths {
            let range = stripe
                .paths
                .iter()
                .find(|r| r.port == path.port)
                .ok_or_else(|| {
                    FrontendError::oracle(format!("{id:?} stripe has no range for {:?}", path.port))
                })?;
            if range.last_input >= crop_window.width {
                return Err(FrontendError::oracle(format!(
                    "{:?} input range ends at {} outside a {} pixel stripe",
                    path.port, range.last_input, crop_window.width
                )));
            }
            paths.push(self.path_geometry(
                path,
                (range.first_input, span(range.first_input, range.last_input)),
                (range.first_output, span(range.first_output, range.last_output)),
            )?);
        }

        let mut stats = try_with_capacity(frame.stats.len(), "oracle stats records")?;
        for config in &frame.stats {
            let assigned = stripe
                .stats
                .iter()
                .find(|s| s.engine == config.engine)
                .ok_or_else(|| {
                    FrontendError::oracle(format!("{id:?} stripe has no split for {:?}", config.engine))
                })?;
            stats.push(StatsRegionSplit {
                engine: assigned.engine,
                horizontal_regions: assigned.horizontal_regions,
                vertical_regions: assigned.vertical_regions,
                roi: assigned.roi,
            });
        }

        let (start, end) = owned_columns;
        Ok(StripeRecord {
            id,
            crop_window,
            paths,
            stats,
            hal_crop: project_hal_crop(&frame.hal_crop, start, end, crop_window.x),
            module_banks: history.snapshot(),
        })
    }
}

/// Width of an inclusive range; zero when inverted.
fn span(first: u32, last: u32) -> u32 {
    if last < first { 0 } else { last - first + 1 }
}

/// Both stripes must be non-empty and stay inside the frame.
fn validate_split(split: &SplitParameters) -> Result<()> {
    let point = split.split_point as u64;
    let fits = point > 0
        && point < split.total_width as u64
        && split.left_padding as u64 <= point
        && point + split.right_padding as u64 <= split.total_width as u64;
    if !fits {
        return Err(FrontendError::invalid(format!(
            "non-positive stripe width: split at {} with padding {}/{} in width {}",
            split.split_point, split.left_padding, split.right_padding, split.total_width
        )));
    }
    Ok(())
}

fn validate_grid(config: &StatsEngineConfig, frame_width: u32) -> Result<()> {
    let n = config.horizontal_regions;
    if n == 0 || config.vertical_regions == 0 || config.roi.width < n || config.roi.right() > frame_width {
        return Err(FrontendError::invalid(format!(
            "{:?} grid of {}x{} regions over {:?} does not fit width {frame_width}",
            config.engine, n, config.vertical_regions, config.roi
        )));
    }
    Ok(())
}

/// HAL crop restricted to the columns `[start, end)` a stripe owns,
/// re-expressed relative to the stripe origin.
fn project_hal_crop(hal_crop: &Rect, start: u32, end: u32, origin: u32) -> Rect {
    let owned = hal_crop.clip_columns(start, end);
    Rect::new(owned.x.saturating_sub(origin), owned.y, owned.width, owned.height)
}
