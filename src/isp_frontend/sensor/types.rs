//! Sensor mode types

use serde::{Deserialize, Serialize};

use crate::isp_frontend::common::error::{FrontendError, Result};

/// Output geometry and timing of the selected sensor mode. Fixed for the
/// lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorGeometry {
    /// Active pixels per line
    pub output_width: u32,
    /// Active lines per frame
    pub output_height: u32,
    /// Minimum horizontal blanking in pixels (`0` = not reported)
    pub min_horizontal_blanking: u32,
    /// Minimum vertical blanking in lines (`0` = not reported)
    pub min_vertical_blanking: u32,
    /// Sensor output pixel clock in Hz
    pub output_pixel_clock: u64,
    /// Maximum frame rate of the mode
    pub max_frame_rate: f64,
    /// Total lines per frame including vertical blanking (`0` = not reported)
    pub num_lines_per_frame: u32,
}

impl SensorGeometry {
    pub fn validate(&self) -> Result<()> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(FrontendError::InvalidDimensions(
                self.output_width,
                self.output_height,
            ));
        }
        Ok(())
    }

    /// True when both blanking intervals are reported by the sensor driver.
    pub fn has_blanking_metadata(&self) -> bool {
        self.min_horizontal_blanking != 0 && self.min_vertical_blanking != 0
    }

    pub fn pixel_count(&self) -> u64 {
        self.output_width as u64 * self.output_height as u64
    }
}
