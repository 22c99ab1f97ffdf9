//! USB gadget keyboard output.
//!
//! On boards running as a USB device (Raspberry Pi Zero and similar) the
//! kernel's HID function exposes `/dev/hidgN`. Writing an 8-byte boot
//! keyboard report presses keys on the attached host; an all-zero report
//! releases them.

use crate::hid::types::{HidError, KeyChord, KeySender};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Size of a boot protocol keyboard report.
pub const REPORT_BYTE_COUNT: usize = 8;

const MAX_PRESSED_KEYS: usize = 6;

/// Build the press report for a chord.
///
/// Layout: modifier bits, reserved byte, up to six usage IDs.
pub fn press_report(chord: &KeyChord) -> Result<[u8; REPORT_BYTE_COUNT], HidError> {
    let mut report = [0u8; REPORT_BYTE_COUNT];
    let mut slot = 2;

    for key in chord.keys() {
        if let Some(bit) = key.modifier_bit() {
            report[0] |= bit;
        } else if let Some(usage) = key.usage_id() {
            if slot >= 2 + MAX_PRESSED_KEYS {
                return Err(HidError::TooManyKeys(chord.keys().len()));
            }
            report[slot] = usage;
            slot += 1;
        }
    }

    Ok(report)
}

/// A keyboard driven through a HID gadget device.
pub struct GadgetKeyboard<W: Write> {
    device: W,
}

impl GadgetKeyboard<File> {
    /// Open a gadget device such as `/dev/hidg0`.
    pub fn open(path: &Path) -> Result<Self, HidError> {
        let device = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| HidError::Open {
                device: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::new(device))
    }
}

impl<W: Write> GadgetKeyboard<W> {
    pub fn new(device: W) -> Self {
        Self { device }
    }

    pub fn into_inner(self) -> W {
        self.device
    }
}

impl<W: Write> KeySender for GadgetKeyboard<W> {
    fn send_chord(&mut self, chord: &KeyChord) -> Result<(), HidError> {
        let report = press_report(chord)?;
        self.device.write_all(&report).map_err(HidError::Write)?;
        self.device
            .write_all(&[0u8; REPORT_BYTE_COUNT])
            .map_err(HidError::Write)?;
        self.device.flush().map_err(HidError::Write)
    }
}
