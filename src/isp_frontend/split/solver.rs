use tracing::{debug, info_span, instrument};

use crate::isp_frontend::common::error::{FrontendError, Result};
use crate::isp_frontend::config::types::SplitOverride;
use crate::isp_frontend::split::oracle::{GeometryOracle, OracleInput, OracleOutput, OverlapBand};
use crate::isp_frontend::split::types::SplitParameters;
use crate::isp_frontend::stripe::types::FullFrameConfig;

/// Split parameters plus, in computed mode, the oracle answer they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSolution {
    pub params: SplitParameters,
    pub oracle_output: Option<OracleOutput>,
}

pub struct SplitGeometrySolver<'a, O: GeometryOracle> {
    oracle: &'a O,
    split_override: Option<SplitOverride>,
}

impl<'a, O: GeometryOracle> SplitGeometrySolver<'a, O> {
    pub fn new(oracle: &'a O, split_override: Option<SplitOverride>) -> Self {
        Self {
            oracle,
            split_override,
        }
    }

    #[instrument(skip(self, frame), fields(width = frame.total_width()))]
    pub fn compute_split_parameters(&self, frame: &FullFrameConfig) -> Result<SplitSolution> {
        let width = frame.total_width();
        if width < 2 {
            return Err(FrontendError::invalid(format!(
                "cannot split a {width} pixel wide frame"
            )));
        }

        if let Some(split) = self.split_override {
            let params = split_from_override(width, &split)?;
            debug!(?params, "Split from static override");
            return Ok(SplitSolution {
                params,
                oracle_output: None,
            });
        }

        let input = OracleInput {
            frame_width: width,
            frame_height: frame.camif_crop.height,
            filters: &frame.filters,
            stats: &frame.stats,
            paths: &frame.paths,
        };
        let output = {
            let _span = info_span!("geometry_oracle").entered();
            self.oracle.solve(&input)?
        };
        let params = split_from_band(width, output.band)?;
        debug!(?params, band = ?output.band, "Split from geometry oracle");
        Ok(SplitSolution {
            params,
            oracle_output: Some(output),
        })
    }
}

/// Natural midpoint shifted by the configured offset, with static padding.
pub fn split_from_override(total_width: u32, split: &SplitOverride) -> Result<SplitParameters> {
    let point = (total_width / 2) as i64 + split.offset as i64;
    let fits = point > 0
        && point < total_width as i64
        && point - split.left_padding as i64 >= 0
        && point + split.right_padding as i64 <= total_width as i64;
    if !fits {
        return Err(FrontendError::invalid(format!(
            "override split at {point} with padding {}/{} does not fit width {total_width}",
            split.left_padding, split.right_padding
        )));
    }
    Ok(SplitParameters {
        split_point: point as u32,
        left_padding: split.left_padding,
        right_padding: split.right_padding,
        total_width,
    })
}

/// Picks the split column inside the oracle's overlap band.
pub fn split_from_band(total_width: u32, band: OverlapBand) -> Result<SplitParameters> {
    let natural = (total_width / 2) as i64;
    let (start, end) = (band.right_stripe_start, band.left_stripe_end);
    let point = if (start..=end).contains(&natural) {
        natural
    } else {
        (start + end).div_euclid(2)
    };

    let left_padding = point - start;
    let right_padding = end - point + 1;
    if left_padding < 0 || right_padding < 0 {
        return Err(FrontendError::oracle(format!(
            "negative padding {left_padding}/{right_padding} from band [{start}, {end}]"
        )));
    }
    if start < 0 || end >= total_width as i64 || point <= 0 || point >= total_width as i64 {
        return Err(FrontendError::oracle(format!(
            "band [{start}, {end}] lies outside a {total_width} pixel frame"
        )));
    }
    Ok(SplitParameters {
        split_point: point as u32,
        left_padding: left_padding as u32,
        right_padding: right_padding as u32,
        total_width,
    })
}
