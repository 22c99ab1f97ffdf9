//! Linux `/dev/i2c-N` backend.

use crate::bus::i2c::PersonSensor;
use crate::bus::types::BusError;
use linux_embedded_hal::I2cdev;
use std::path::Path;

/// Open the sensor on a Linux I2C character device.
pub fn open_i2c(device: &Path, address: u8) -> Result<PersonSensor<I2cdev>, BusError> {
    let i2c = I2cdev::new(device).map_err(|e| BusError::Open {
        device: device.display().to_string(),
        reason: e.to_string(),
    })?;
    tracing::info!(
        device = %device.display(),
        address = %format!("{address:#04x}"),
        "Opened sensor bus"
    );
    Ok(PersonSensor::with_address(i2c, address))
}
