//! Frame source abstraction shared by all bus backends.

use std::time::Duration;

/// I2C address of the Person Sensor.
pub const PERSON_SENSOR_I2C_ADDRESS: u8 = 0x62;

/// Something that can produce one raw sensor result per call.
///
/// Implementations block until a full result has been read or the read
/// fails. The returned buffer is handed to the decoder unchanged.
pub trait FrameSource {
    fn read_raw(&mut self) -> Result<Vec<u8>, BusError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_raw(&mut self) -> Result<Vec<u8>, BusError> {
        (**self).read_raw()
    }
}

/// Errors that can occur while reading from the sensor bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus device could not be opened.
    Open { device: String, reason: String },
    /// The transfer itself failed.
    Transport(String),
    /// No result arrived within the read timeout.
    Timeout(Duration),
    /// The reader thread is gone.
    Disconnected,
    /// A replay capture could not be read or parsed.
    Replay(String),
    /// A replay capture has no more frames.
    Exhausted,
    /// No hardware bus backend on this platform.
    Unsupported,
}

impl std::fmt::Display for BusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusError::Open { device, reason } => write!(f, "Could not open {device}: {reason}"),
            BusError::Transport(e) => write!(f, "Bus transfer failed: {e}"),
            BusError::Timeout(t) => write!(f, "Sensor read timed out after {} ms", t.as_millis()),
            BusError::Disconnected => write!(f, "Sensor reader disconnected"),
            BusError::Replay(e) => write!(f, "Replay error: {e}"),
            BusError::Exhausted => write!(f, "Replay capture exhausted"),
            BusError::Unsupported => {
                write!(f, "No I2C backend on this platform; use --replay")
            }
        }
    }
}

impl std::error::Error for BusError {}
