//! Sensor timing module
//!
//! This module describes the selected sensor mode and derives line timing and
//! the pixel clock a front-end instance needs to keep up with it.

mod timing;
pub mod types;

pub use timing::SensorTimingModel;
pub use types::SensorGeometry;
