//! Non-Linux placeholder for the hardware bus.
//!
//! This exists so the crate (and binary) can compile on targets without
//! `/dev/i2c-N`. Replay captures still work everywhere.

use crate::bus::types::{BusError, FrameSource};
use std::path::Path;

/// Never constructed; keeps the `open_i2c` signature uniform across targets.
pub enum NoI2c {}

impl FrameSource for NoI2c {
    fn read_raw(&mut self) -> Result<Vec<u8>, BusError> {
        match *self {}
    }
}

/// There is no I2C backend on this platform.
pub fn open_i2c(_device: &Path, _address: u8) -> Result<NoI2c, BusError> {
    Err(BusError::Unsupported)
}
