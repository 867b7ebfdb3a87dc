use tracing::debug;

use crate::isp_frontend::sensor::types::SensorGeometry;

/// Derives line timing and required processing clocks from a sensor mode.
#[derive(Debug, Clone)]
pub struct SensorTimingModel {
    geometry: SensorGeometry,
    burst_alignment: u32,
    vertical_blanking_floor: u32,
    pixel_path_enabled: bool,
}

impl SensorTimingModel {
    pub fn new(geometry: SensorGeometry, burst_alignment: u32, vertical_blanking_floor: u32) -> Self {
        Self {
            geometry,
            burst_alignment: burst_alignment.max(1),
            vertical_blanking_floor,
            pixel_path_enabled: true,
        }
    }

    /// Marks the session as pass-through (raw channels only). Required clock
    /// queries then return `0`.
    pub fn with_pixel_path(mut self, enabled: bool) -> Self {
        self.pixel_path_enabled = enabled;
        self
    }

    pub fn geometry(&self) -> &SensorGeometry {
        &self.geometry
    }

    pub fn pixel_path_enabled(&self) -> bool {
        self.pixel_path_enabled
    }

    /// Sensor line length in pixel clocks, including horizontal blanking.
    ///
    /// Without reported horizontal blanking the length is recovered from the
    /// frame rate and total lines per frame.
    pub fn line_length_pixels(&self) -> u64 {
        let g = &self.geometry;
        if g.min_horizontal_blanking != 0 {
            return g.output_width as u64 + g.min_horizontal_blanking as u64;
        }
        if g.max_frame_rate > 0.0 && g.num_lines_per_frame != 0 {
            let derived =
                g.output_pixel_clock as f64 / (g.max_frame_rate * g.num_lines_per_frame as f64);
            return (derived.round() as u64).max(g.output_width as u64);
        }
        g.output_width as u64
    }

    /// Line time in microseconds at `pixel_clock_hz`. `0.0` means unknown.
    pub fn line_duration_us(&self, pixel_clock_hz: u64) -> f64 {
        if pixel_clock_hz == 0 {
            return 0.0;
        }
        self.line_length_pixels() as f64 * 1_000_000.0 / pixel_clock_hz as f64
    }

    /// Clock one instance needs to process `input_width` pixels per sensor
    /// line without falling behind the sensor.
    ///
    /// Returns `0` for pass-through sessions. The platform minimum clock is
    /// not applied here.
    pub fn required_pixel_clock(&self, input_width: u32) -> u64 {
        if !self.pixel_path_enabled {
            return 0;
        }
        let g = &self.geometry;
        let line_length = self.line_length_pixels();
        if line_length == 0 {
            return 0;
        }
        let blanking = line_length.saturating_sub(g.output_width as u64);
        let aligned = align_up(input_width as u64 + blanking, self.burst_alignment as u64);

        let mut clock = div_ceil(
            aligned as u128 * g.output_pixel_clock as u128,
            line_length as u128,
        );

        if g.min_vertical_blanking < self.vertical_blanking_floor {
            let lines = g.output_height as u128;
            clock = div_ceil(
                clock * (lines + self.vertical_blanking_floor as u128),
                lines + g.min_vertical_blanking as u128,
            );
        }

        debug!(input_width, aligned, line_length, clock = clock as u64, "Required pixel clock");
        clock as u64
    }

    /// Time one instance spends on a line of `input_width` pixels at the clock
    /// returned by [`required_pixel_clock`](Self::required_pixel_clock).
    /// `0.0` when that clock is `0`.
    pub fn processing_line_duration_us(&self, input_width: u32) -> f64 {
        let clock = self.required_pixel_clock(input_width);
        if clock == 0 {
            return 0.0;
        }
        let blanking = self
            .line_length_pixels()
            .saturating_sub(self.geometry.output_width as u64);
        let aligned = align_up(input_width as u64 + blanking, self.burst_alignment as u64);
        aligned as f64 * 1_000_000.0 / clock as f64
    }

    /// Frame rate the sensor can sustain with its minimum blanking, capped by
    /// the mode's maximum frame rate.
    pub fn sensor_frame_rate(&self) -> f64 {
        let g = &self.geometry;
        if !g.has_blanking_metadata() || g.output_pixel_clock == 0 {
            return g.max_frame_rate;
        }
        let frame_clocks =
            self.line_length_pixels() as f64 * (g.output_height + g.min_vertical_blanking) as f64;
        let achievable = g.output_pixel_clock as f64 / frame_clocks;
        if g.max_frame_rate > 0.0 {
            achievable.min(g.max_frame_rate)
        } else {
            achievable
        }
    }

    /// Fraction of a frame period spent on active lines.
    pub fn vertical_blanking_ratio(&self) -> f64 {
        let g = &self.geometry;
        let total = g.output_height as f64 + g.min_vertical_blanking as f64;
        if total == 0.0 {
            return 1.0;
        }
        g.output_height as f64 / total
    }
}

pub(crate) fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

fn div_ceil(num: u128, den: u128) -> u128 {
    num.div_ceil(den)
}
