//! Person Sensor reads over any `embedded-hal` I2C implementation.

use crate::bus::types::{BusError, FrameSource, PERSON_SENSOR_I2C_ADDRESS};
use crate::core::frame::RESULT_BYTE_COUNT;
use embedded_hal::i2c::I2c;

/// A Person Sensor attached to an I2C bus.
pub struct PersonSensor<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> PersonSensor<I2C> {
    /// Use the sensor at its factory address.
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, PERSON_SENSOR_I2C_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> FrameSource for PersonSensor<I2C> {
    fn read_raw(&mut self) -> Result<Vec<u8>, BusError> {
        let mut buf = vec![0u8; RESULT_BYTE_COUNT];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(|e| BusError::Transport(format!("{e:?}")))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    /// Answers reads with a fixed byte pattern and remembers the address used.
    struct FakeBus {
        fill: u8,
        fail: bool,
        last_address: Option<u8>,
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            self.last_address = Some(address);
            if self.fail {
                return Err(ErrorKind::Bus);
            }
            for op in operations {
                if let Operation::Read(buf) = op {
                    buf.fill(self.fill);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_reads_full_result_from_sensor_address() {
        let bus = FakeBus {
            fill: 0x00,
            fail: false,
            last_address: None,
        };
        let mut sensor = PersonSensor::new(bus);
        let raw = sensor.read_raw().unwrap();
        assert_eq!(raw.len(), RESULT_BYTE_COUNT);

        let bus = sensor.release();
        assert_eq!(bus.last_address, Some(0x62));
    }

    #[test]
    fn test_transport_failure_is_reported() {
        let bus = FakeBus {
            fill: 0,
            fail: true,
            last_address: None,
        };
        let mut sensor = PersonSensor::with_address(bus, 0x10);
        assert!(matches!(sensor.read_raw(), Err(BusError::Transport(_))));
    }
}
