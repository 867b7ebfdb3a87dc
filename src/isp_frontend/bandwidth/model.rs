use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::isp_frontend::bandwidth::types::{
    ActiveVote, BandwidthVote, InstanceVote, PortVote, VoteOutcome, VoteSet,
};
use crate::isp_frontend::common::error::{FrontendError, Result};
use crate::isp_frontend::common::geometry::StripeSlots;
use crate::isp_frontend::config::types::BandwidthConfig;
use crate::isp_frontend::sensor::SensorTimingModel;
use crate::isp_frontend::stripe::format::FormatTable;
use crate::isp_frontend::stripe::types::{
    AuxChannelConfig, FullFrameConfig, OutputPort, PathConfig, PortKind, StripeRecord, StripeSet,
};

/// Converts bytes per sensor line into bytes per second.
///
/// With blanking metadata the line time (active plus horizontal blanking) is
/// used; otherwise the per-line amount is multiplied by frame height and
/// frame rate.
struct LineRate<'a> {
    timing: &'a SensorTimingModel,
    line_time_us: Option<f64>,
}

impl<'a> LineRate<'a> {
    fn new(timing: &'a SensorTimingModel) -> Self {
        let geometry = timing.geometry();
        let line_time = timing.line_duration_us(geometry.output_pixel_clock);
        let line_time_us = (geometry.has_blanking_metadata() && line_time > 0.0).then_some(line_time);
        Self {
            timing,
            line_time_us,
        }
    }

    fn frame_based(&self, bytes_per_line: f64) -> f64 {
        let geometry = self.timing.geometry();
        bytes_per_line * geometry.output_height as f64 * geometry.max_frame_rate
    }

    fn instantaneous(&self, bytes_per_line: f64) -> f64 {
        match self.line_time_us {
            Some(line_time) => bytes_per_line * 1_000_000.0 / line_time,
            None => self.frame_based(bytes_per_line),
        }
    }

    /// Interconnect rate of a path whose instance processes `input_width`
    /// columns per line.
    fn internal(&self, bytes_per_line: f64, input_width: u32) -> f64 {
        if self.line_time_us.is_none() {
            return self.frame_based(bytes_per_line);
        }
        let processing = self.timing.processing_line_duration_us(input_width);
        if processing > 0.0 {
            bytes_per_line * 1_000_000.0 / processing
        } else {
            self.instantaneous(bytes_per_line)
        }
    }

    /// Long-term average: line rate reduced by the vertical blanking share,
    /// capped by the mode's frame rate.
    fn average(&self, bytes_per_line: f64) -> f64 {
        let frame_based = self.frame_based(bytes_per_line);
        match self.line_time_us {
            Some(line_time) => {
                let blanked = bytes_per_line * 1_000_000.0 / line_time
                    * self.timing.vertical_blanking_ratio();
                if frame_based > 0.0 {
                    blanked.min(frame_based)
                } else {
                    blanked
                }
            }
            None => frame_based,
        }
    }
}

#[derive(Default, Clone, Copy)]
struct Accumulated {
    external: f64,
    internal: f64,
    active: f64,
}

impl Accumulated {
    fn add(&mut self, other: Accumulated) {
        self.external += other.external;
        self.internal += other.internal;
        self.active += other.active;
    }
}

pub struct BandwidthModel<'a> {
    config: &'a BandwidthConfig,
    formats: &'a FormatTable,
    timing: &'a SensorTimingModel,
}

impl<'a> BandwidthModel<'a> {
    pub fn new(config: &'a BandwidthConfig, formats: &'a FormatTable, timing: &'a SensorTimingModel) -> Self {
        Self {
            config,
            formats,
            timing,
        }
    }

    /// Computes this request's votes from scratch.
    #[instrument(skip_all, fields(mode = ?stripes.mode, ports = enabled_ports.len(), startup_counter = startup_counter))]
    pub fn compute_votes(
        &self,
        stripes: &StripeSet,
        frame: &FullFrameConfig,
        enabled_ports: &[OutputPort],
        startup_counter: u32,
    ) -> Result<VoteOutcome> {
        if !self.config.enabled {
            debug!("Bandwidth accounting disabled");
            return Ok(VoteOutcome::Disabled);
        }
        if enabled_ports.is_empty() {
            return Err(FrontendError::invalid("no output ports enabled"));
        }
        for port in enabled_ports {
            if !frame.ports().any(|p| p == *port) {
                return Err(FrontendError::invalid(format!("{port:?} is enabled but not configured")));
            }
        }

        if let Some(total) = self.config.fixed_total_bytes_per_second {
            debug!(total, "Distributing fixed bandwidth");
            return Ok(VoteOutcome::Votes(Self::fixed_votes(total, stripes, enabled_ports)));
        }

        let rate = LineRate::new(self.timing);
        let crop_height = frame.camif_crop.height.max(1) as f64;
        let overhead = self.config.stats_overhead_bytes_per_second as f64;

        let mut instances = StripeSlots::empty();
        let mut per_port: BTreeMap<OutputPort, Accumulated> = BTreeMap::new();
        for record in stripes.instances() {
            let mut sum = Accumulated::default();
            for (port, path) in self.path_rates(record, frame, enabled_ports, &rate, crop_height)? {
                sum.add(path);
                per_port.entry(port).or_default().add(path);
            }
            sum.external += overhead;
            sum.active += overhead * self.timing.vertical_blanking_ratio();
            instances[record.id] = Some(sum);
        }

        let mut channels = Vec::new();
        for aux in &frame.aux_channels {
            if enabled_ports.contains(&aux.port) {
                channels.push((aux.port, self.channel_rate(aux, &rate)?));
            }
        }

        let boost = startup_counter < self.config.startup_frames;
        let multiplier = if boost { self.config.startup_multiplier } else { 1.0 };
        let decoupled = self.config.decoupled_active_vote;
        let vote = |instantaneous: f64, active: f64| BandwidthVote {
            instantaneous_bytes_per_second: (instantaneous * multiplier).ceil() as u64,
            active_bytes_per_second: decoupled.then(|| active.ceil() as u64),
        };

        let votes = VoteSet {
            instances: instances.map(|_, sum| {
                sum.map(|s: Accumulated| InstanceVote {
                    external: vote(s.external, s.active),
                    internal: vote(s.internal, s.internal * self.timing.vertical_blanking_ratio()),
                })
            }),
            ports: per_port
                .into_iter()
                .map(|(port, s)| PortVote {
                    port,
                    vote: vote(s.external, s.active),
                })
                .collect(),
            channels: channels
                .into_iter()
                .map(|(port, s)| PortVote {
                    port,
                    vote: vote(s.external, s.active),
                })
                .collect(),
            active_vote: if decoupled {
                ActiveVote::Computed
            } else {
                ActiveVote::Disabled
            },
            startup_boost: boost,
        };
        debug!(
            total = votes.total_instantaneous(),
            boost,
            "Bandwidth votes computed"
        );
        Ok(VoteOutcome::Votes(votes))
    }

    fn path_rates(
        &self,
        record: &StripeRecord,
        frame: &FullFrameConfig,
        enabled_ports: &[OutputPort],
        rate: &LineRate<'_>,
        crop_height: f64,
    ) -> Result<Vec<(OutputPort, Accumulated)>> {
        let mut rates = Vec::with_capacity(record.paths.len());
        for path in &record.paths {
            if path.port.kind() != PortKind::Pixel || !enabled_ports.contains(&path.port) {
                continue;
            }
            let config = frame
                .path(path.port)
                .ok_or_else(|| FrontendError::invalid(format!("{:?} has no path config", path.port)))?;
            let descriptor = self.formats.get(path.format)?;

            // Output lines written per sensor line; above 1 when the crop is
            // shorter than the output.
            let rate_factor = path.output_height as f64 / crop_height;
            let transported = if descriptor.is_tile_compressed() {
                path.transport.bytes as f64 / self.compression_ratio(config)
            } else {
                path.transport.bytes as f64
            };
            let external_line = transported * rate_factor;
            let internal_line = path.transport.uncompressed_bytes as f64 * rate_factor;
            let divisor = config.frame_rate_divisor.max(1) as f64;

            rates.push((
                path.port,
                Accumulated {
                    external: rate.instantaneous(external_line),
                    internal: rate.internal(internal_line, path.input_width),
                    active: rate.average(external_line) / divisor,
                },
            ));
        }
        Ok(rates)
    }

    fn channel_rate(&self, aux: &AuxChannelConfig, rate: &LineRate<'_>) -> Result<Accumulated> {
        let geometry = self.timing.geometry();
        let descriptor = self.formats.get(aux.format)?;
        let mut line = descriptor.transport_width(0, geometry.output_width).bytes as f64;

        if let Some((w, h)) = aux.native_size {
            let native = w as u64 * h as u64;
            if native < geometry.pixel_count() {
                line *= native as f64 / geometry.pixel_count() as f64;
            }
        }
        Ok(Accumulated {
            external: rate.instantaneous(line),
            internal: 0.0,
            active: rate.average(line),
        })
    }

    fn compression_ratio(&self, path: &PathConfig) -> f64 {
        let pixels = path.width as u64 * path.height as u64;
        let ratio = if self.config.lossy_compression && pixels >= self.config.uhd_threshold_pixels {
            self.config.lossy_compression_ratio
        } else {
            self.config.compression_ratio
        };
        if ratio > 0.0 { ratio } else { 1.0 }
    }

    /// Splits a fixed total evenly across enabled ports; pixel-port shares
    /// are then split evenly across instances. Division remainders go to the
    /// first port and the first instance so the votes add up to `total`.
    fn fixed_votes(total: u64, stripes: &StripeSet, enabled_ports: &[OutputPort]) -> VoteSet {
        let fixed = |instantaneous_bytes_per_second: u64| BandwidthVote {
            instantaneous_bytes_per_second,
            active_bytes_per_second: None,
        };
        let count = enabled_ports.len() as u64;
        let shares: Vec<(OutputPort, u64)> = enabled_ports
            .iter()
            .enumerate()
            .map(|(i, port)| {
                let share = total / count + if i == 0 { total % count } else { 0 };
                (*port, share)
            })
            .collect();

        let (pixel, aux): (Vec<(OutputPort, u64)>, Vec<(OutputPort, u64)>) = shares
            .into_iter()
            .partition(|(p, _)| p.kind() == PortKind::Pixel);

        let pixel_total: u64 = pixel.iter().map(|(_, share)| share).sum();
        let instance_ids: Vec<_> = stripes.instances().iter().map(|r| r.id).collect();
        let n = instance_ids.len() as u64;
        let mut instances = StripeSlots::empty();
        if n > 0 {
            for (i, id) in instance_ids.into_iter().enumerate() {
                let vote = fixed(pixel_total / n + if i == 0 { pixel_total % n } else { 0 });
                instances[id] = Some(InstanceVote {
                    external: vote,
                    internal: vote,
                });
            }
        }

        VoteSet {
            instances,
            ports: pixel
                .into_iter()
                .map(|(port, share)| PortVote { port, vote: fixed(share) })
                .collect(),
            channels: aux
                .into_iter()
                .map(|(port, share)| PortVote { port, vote: fixed(share) })
                .collect(),
            active_vote: ActiveVote::Disabled,
            startup_boost: false,
        }
    }
}
