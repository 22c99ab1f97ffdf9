//! Sensor bus access for the presence lock agent.
//!
//! The core only needs raw results; this module provides the sources that
//! produce them: a Person Sensor on an I2C bus, a replayed capture, and a
//! wrapper that bounds how long any read may block.

pub mod i2c;
pub mod replay;
pub mod timed;
pub mod types;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(not(target_os = "linux"))]
pub mod unsupported;

// Re-export commonly used types
pub use i2c::PersonSensor;
pub use replay::{parse_hex, to_hex, ReplaySource};
pub use timed::TimedSource;
pub use types::{BusError, FrameSource, PERSON_SENSOR_I2C_ADDRESS};

#[cfg(target_os = "linux")]
pub use linux::open_i2c;

#[cfg(not(target_os = "linux"))]
pub use unsupported::open_i2c;
