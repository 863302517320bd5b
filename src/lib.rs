//! User-space driver for the ADS7846 resistive touch controller.
//!
//! [`sampler`] reads the chip through a [`bus::TouchBus`], [`calibration`]
//! maps raw readings into pixels and [`orientation`] rotates them into screen
//! space. [`driver::Ads7846`] ties these together and keeps the touch state.

pub mod bus;
pub mod calibration;
pub mod config;
pub mod driver;
pub mod orientation;
pub mod protocol;
pub mod sampler;

pub use crate::bus::RppalBus;
pub use crate::bus::TouchBus;
pub use crate::calibration::CalibrationMatrix;
pub use crate::calibration::DisplayGeometry;
pub use crate::driver::Ads7846;
pub use crate::driver::TouchPoint;
pub use crate::orientation::Orientation;
pub use crate::sampler::RawSample;
