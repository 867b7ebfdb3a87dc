//! Split decision types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineMode {
    Single,
    Dual,
}

/// Where the frame is split and how far each stripe reaches past the split.
///
/// The left stripe covers `[0, split_point + right_padding)` and the right
/// stripe covers `[split_point - left_padding, total_width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitParameters {
    pub split_point: u32,
    pub left_padding: u32,
    pub right_padding: u32,
    pub total_width: u32,
}

impl SplitParameters {
    pub fn left_stripe_width(&self) -> u32 {
        self.split_point + self.right_padding
    }

    pub fn right_stripe_width(&self) -> u32 {
        self.total_width - self.split_point + self.left_padding
    }

    /// First CAMIF column of the right stripe.
    pub fn right_stripe_start(&self) -> u32 {
        self.split_point - self.left_padding
    }

    /// Columns processed by both instances.
    pub fn overlap(&self) -> u32 {
        self.left_padding + self.right_padding
    }

    /// Fraction of the frame owned by the left stripe.
    pub fn ratio(&self) -> f64 {
        self.split_point as f64 / self.total_width as f64
    }
}
