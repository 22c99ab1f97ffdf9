//! Dry-run key sender.
//!
//! Logs each chord instead of pressing it, for running the agent on a
//! machine without a HID gadget or while tuning thresholds.

use crate::hid::types::{HidError, KeyChord, KeySender};

/// A key sender that only logs.
#[derive(Debug, Default)]
pub struct LogOnlySender;

impl LogOnlySender {
    pub fn new() -> Self {
        Self
    }
}

impl KeySender for LogOnlySender {
    fn send_chord(&mut self, chord: &KeyChord) -> Result<(), HidError> {
        tracing::info!(chord = %chord, "Dry run: would send key chord");
        Ok(())
    }
}
