//! Common utilities module
//!
//! This module contains the error type and the small geometry types shared
//! across the front-end planning stages.

pub mod error;
pub mod geometry;

pub use error::{FrontendError, Result};
pub use geometry::{Rect, StripeId, StripeSlots};
