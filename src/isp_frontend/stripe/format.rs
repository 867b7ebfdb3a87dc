//! Output format descriptors and transport width rules

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::isp_frontend::common::error::{FrontendError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatId {
    Nv12,
    UbwcNv12,
    P010,
    UbwcTp10,
    Y8,
    Plain16,
    Mipi10,
    Mipi12,
}

/// How pixels of one line are laid out in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// `bits_per_pixel / 8` bytes per pixel
    Linear,
    /// Fixed-point packing, `num / den` bytes per pixel
    Packed { num: u32, den: u32 },
    /// Tiles of `tile_width` pixels stored as `tile_bytes` bytes each
    TileCompressed { tile_width: u32, tile_bytes: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Bits per sample of the primary plane before packing
    pub bits_per_pixel: u32,
    /// Total-over-primary plane size ratio, `(3, 2)` for 4:2:0
    pub plane_factor: (u32, u32),
    pub layout: Layout,
}

/// Tile coverage of one stripe's column range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpan {
    pub first_tile: u32,
    pub tile_count: u32,
    /// Bytes written into a first tile shared with the stripe to the left
    pub left_partial_bytes: u32,
    /// Bytes written into a last tile shared with the stripe to the right
    pub right_partial_bytes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportWidth {
    /// Bytes per line as transported, all planes
    pub bytes: u64,
    /// Bytes per line before packing or tiling, all planes
    pub uncompressed_bytes: u64,
    pub tile: Option<TileSpan>,
}

impl FormatDescriptor {
    pub const fn linear(bits_per_pixel: u32, plane_factor: (u32, u32)) -> Self {
        Self {
            bits_per_pixel,
            plane_factor,
            layout: Layout::Linear,
        }
    }

    pub fn is_tile_compressed(&self) -> bool {
        matches!(self.layout, Layout::TileCompressed { .. })
    }

    fn apply_planes(&self, bytes: u64) -> u64 {
        let (num, den) = self.plane_factor;
        (bytes * num as u64).div_ceil(den.max(1) as u64)
    }

    fn unpacked_bytes(&self, width: u32) -> u64 {
        (width as u64 * self.bits_per_pixel as u64).div_ceil(8)
    }

    /// Transport width of columns `[offset, offset + width)` of a path.
    pub fn transport_width(&self, offset: u32, width: u32) -> TransportWidth {
        let uncompressed_bytes = self.apply_planes(self.unpacked_bytes(width));
        if width == 0 {
            return TransportWidth {
                bytes: 0,
                uncompressed_bytes,
                tile: None,
            };
        }
        match self.layout {
            Layout::Linear => TransportWidth {
                bytes: uncompressed_bytes,
                uncompressed_bytes,
                tile: None,
            },
            Layout::Packed { num, den } => {
                let packed = (width as u64 * num as u64).div_ceil(den.max(1) as u64);
                TransportWidth {
                    bytes: self.apply_planes(packed),
                    uncompressed_bytes,
                    tile: None,
                }
            }
            Layout::TileCompressed {
                tile_width,
                tile_bytes,
            } => {
                let span = tile_span(offset, width, tile_width, tile_bytes);
                TransportWidth {
                    bytes: self.apply_planes(span.tile_count as u64 * tile_bytes as u64),
                    uncompressed_bytes,
                    tile: Some(span),
                }
            }
        }
    }

    /// Byte offset of column `offset` within the primary plane of a line.
    pub fn byte_offset(&self, offset: u32) -> u64 {
        match self.layout {
            Layout::Linear => offset as u64 * self.bits_per_pixel as u64 / 8,
            Layout::Packed { num, den } => offset as u64 * num as u64 / den.max(1) as u64,
            Layout::TileCompressed {
                tile_width,
                tile_bytes,
            } => (offset / tile_width.max(1)) as u64 * tile_bytes as u64,
        }
    }
}

fn tile_span(offset: u32, width: u32, tile_width: u32, tile_bytes: u32) -> TileSpan {
    let tile_width = tile_width.max(1);
    let end = offset + width;
    let first_tile = offset / tile_width;
    let last_tile = end.div_ceil(tile_width);
    let partial = |pixels: u32| (pixels as u64 * tile_bytes as u64).div_ceil(tile_width as u64) as u32;

    let head = offset % tile_width;
    let left_partial_bytes = if head != 0 { partial(tile_width - head) } else { 0 };
    let tail = end % tile_width;
    let right_partial_bytes = if tail != 0 { partial(tail) } else { 0 };

    TileSpan {
        first_tile,
        tile_count: last_tile - first_tile,
        left_partial_bytes,
        right_partial_bytes,
    }
}

/// Format descriptors available to the session.
#[derive(Debug, Clone, Default)]
pub struct FormatTable {
    descriptors: HashMap<FormatId, FormatDescriptor>,
}

impl FormatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptors for every [`FormatId`].
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.insert(FormatId::Nv12, FormatDescriptor::linear(8, (3, 2)));
        table.insert(FormatId::P010, FormatDescriptor::linear(16, (3, 2)));
        table.insert(FormatId::Y8, FormatDescriptor::linear(8, (1, 1)));
        table.insert(FormatId::Plain16, FormatDescriptor::linear(16, (1, 1)));
        table.insert(
            FormatId::UbwcNv12,
            FormatDescriptor {
                bits_per_pixel: 8,
                plane_factor: (3, 2),
                layout: Layout::TileCompressed {
                    tile_width: 32,
                    tile_bytes: 32,
                },
            },
        );
        // TP10 stores three 10-bit samples per 4 bytes
        table.insert(
            FormatId::UbwcTp10,
            FormatDescriptor {
                bits_per_pixel: 10,
                plane_factor: (3, 2),
                layout: Layout::TileCompressed {
                    tile_width: 48,
                    tile_bytes: 64,
                },
            },
        );
        table.insert(
            FormatId::Mipi10,
            FormatDescriptor {
                bits_per_pixel: 10,
                plane_factor: (1, 1),
                layout: Layout::Packed { num: 5, den: 4 },
            },
        );
        table.insert(
            FormatId::Mipi12,
            FormatDescriptor {
                bits_per_pixel: 12,
                plane_factor: (1, 1),
                layout: Layout::Packed { num: 3, den: 2 },
            },
        );
        table
    }

    pub fn insert(&mut self, id: FormatId, descriptor: FormatDescriptor) {
        self.descriptors.insert(id, descriptor);
    }

    pub fn remove(&mut self, id: FormatId) -> Option<FormatDescriptor> {
        self.descriptors.remove(&id)
    }

    pub fn get(&self, id: FormatId) -> Result<&FormatDescriptor> {
        self.descriptors
            .get(&id)
            .ok_or_else(|| FrontendError::invalid(format!("no format descriptor for {id:?}")))
    }
}
