//! Front-end configuration types

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::isp_frontend::common::error::Result;
use crate::isp_frontend::stripe::types::OutputPort;

/// Static split geometry used instead of the geometry oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOverride {
    /// Added to the natural midpoint to get the split column
    pub offset: i32,
    pub left_padding: u32,
    pub right_padding: u32,
}

/// Dual-instance switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualConfig {
    /// Dual processing allowed at all
    pub enabled: bool,
    pub force_dual: bool,
    pub force_single: bool,
    /// Required clock above which dual mode is chosen
    pub dual_clock_threshold_hz: u64,
    /// Static split geometry; `None` delegates to the geometry oracle
    pub split_override: Option<SplitOverride>,
}

impl Default for DualConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            force_dual: false,
            force_single: false,
            dual_clock_threshold_hz: 480_000_000,
            split_override: None,
        }
    }
}

/// Per-chip-variant limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityTable {
    pub max_instance_clock_hz: u64,
    pub platform_min_clock_hz: u64,
    /// Vertical blanking lines the hardware needs between frames
    pub min_vertical_blanking_floor: u32,
    /// Pixel granularity of input line bursts
    pub burst_alignment: u32,
    /// Widest output one instance can produce, per port
    pub max_path_width: HashMap<OutputPort, u32>,
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self {
            max_instance_clock_hz: 600_000_000,
            platform_min_clock_hz: 100_000_000,
            min_vertical_blanking_floor: 32,
            burst_alignment: 16,
            max_path_width: HashMap::from([
                (OutputPort::Full, 4928),
                (OutputPort::Display, 4928),
                (OutputPort::FaceDetect, 1920),
                (OutputPort::PixelRaw, 4928),
            ]),
        }
    }
}

impl CapabilityTable {
    pub fn max_path_width(&self, port: OutputPort) -> Option<u32> {
        self.max_path_width.get(&port).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandwidthConfig {
    pub enabled: bool,
    /// Fixed total vote; bypasses computation when set
    pub fixed_total_bytes_per_second: Option<u64>,
    /// Also emit the long-term-average vote
    pub decoupled_active_vote: bool,
    pub stats_overhead_bytes_per_second: u64,
    /// Requests after session start that get the safety multiplier
    pub startup_frames: u32,
    pub startup_multiplier: f64,
    /// Compression ratio of tile-compressed outputs
    pub compression_ratio: f64,
    pub lossy_compression: bool,
    /// Ratio used instead of `compression_ratio` at UHD and above with lossy compression
    pub lossy_compression_ratio: f64,
    pub uhd_threshold_pixels: u64,
}

impl Default for BandwidthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fixed_total_bytes_per_second: None,
            decoupled_active_vote: true,
            stats_overhead_bytes_per_second: 80_000_000,
            startup_frames: 3,
            startup_multiplier: 1.5,
            compression_ratio: 1.3,
            lossy_compression: false,
            lossy_compression_ratio: 2.0,
            uhd_threshold_pixels: 3840 * 2160,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub enabled: bool,
    pub fixed_clock_hz: Option<u64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fixed_clock_hz: None,
        }
    }
}

/// Configuration of one front-end session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub dual: DualConfig,
    pub capabilities: CapabilityTable,
    pub bandwidth: BandwidthConfig,
    pub clock: ClockConfig,
}

impl FrontendConfig {
    pub fn builder() -> FrontendConfigBuilder {
        FrontendConfigBuilder::default()
    }

    /// Loads a JSON configuration; missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading front-end configuration");
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Builder for FrontendConfig
#[derive(Default)]
pub struct FrontendConfigBuilder {
    dual: Option<DualConfig>,
    capabilities: Option<CapabilityTable>,
    bandwidth: Option<BandwidthConfig>,
    clock: Option<ClockConfig>,
}

impl FrontendConfigBuilder {
    pub fn dual(mut self, dual: DualConfig) -> Self {
        self.dual = Some(dual);
        self
    }

    pub fn capabilities(mut self, capabilities: CapabilityTable) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn bandwidth(mut self, bandwidth: BandwidthConfig) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    pub fn clock(mut self, clock: ClockConfig) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn split_override(mut self, split: SplitOverride) -> Self {
        let mut dual = self.dual.take().unwrap_or_default();
        dual.split_override = Some(split);
        self.dual = Some(dual);
        self
    }

    pub fn fixed_bandwidth(mut self, total_bytes_per_second: u64) -> Self {
        let mut bandwidth = self.bandwidth.take().unwrap_or_default();
        bandwidth.fixed_total_bytes_per_second = Some(total_bytes_per_second);
        self.bandwidth = Some(bandwidth);
        self
    }

    pub fn build(self) -> FrontendConfig {
        let default = FrontendConfig::default();
        FrontendConfig {
            dual: self.dual.unwrap_or(default.dual),
            capabilities: self.capabilities.unwrap_or(default.capabilities),
            bandwidth: self.bandwidth.unwrap_or(default.bandwidth),
            clock: self.clock.unwrap_or(default.clock),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_config_builder() {
        let config = FrontendConfig::builder()
            .split_override(SplitOverride {
                offset: 0,
                left_padding: 16,
                right_padding: 16,
            })
            .fixed_bandwidth(800_000_000)
            .build();

        assert_eq!(config.dual.split_override.unwrap().left_padding, 16);
        assert!(config.dual.enabled);
        assert_eq!(config.bandwidth.fixed_total_bytes_per_second, Some(800_000_000));
        assert_eq!(config.capabilities, CapabilityTable::default());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = FrontendConfig::from_json_str(
            r#"{ "dual": { "force_dual": true }, "bandwidth": { "startup_frames": 7 } }"#,
        )
        .unwrap();
        assert!(config.dual.force_dual);
        assert!(config.dual.enabled);
        assert_eq!(config.bandwidth.startup_frames, 7);
        assert_eq!(config.bandwidth.startup_multiplier, 1.5);
        assert!(config.clock.enabled);
        assert_eq!(config.clock.fixed_clock_hz, None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "capabilities": {{ "max_instance_clock_hz": 480000000, "max_path_width": {{ "Full": 4096 }} }} }}"#
        )
        .unwrap();

        let config = FrontendConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.capabilities.max_instance_clock_hz, 480_000_000);
        assert_eq!(config.capabilities.max_path_width(OutputPort::Full), Some(4096));
        assert_eq!(config.capabilities.max_path_width(OutputPort::Display), None);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = FrontendConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(
            err,
            crate::isp_frontend::common::error::FrontendError::ConfigParse(_)
        ));
    }
}
