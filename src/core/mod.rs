//! Core functionality for the presence lock agent.
//!
//! This module contains:
//! - Decoding of raw Person Sensor results into frames
//! - Classification of a frame's faces into user / onlooker signals
//! - The debounce state machine that turns signals into actions

pub mod classifier;
pub mod frame;
pub mod presence;

// Re-export commonly used types
pub use classifier::{classify, classify_faces, ClassifierConfig, Classification};
pub use frame::{
    decode, verify_checksum, DecodeError, FaceRecord, Frame, MAX_FACES, RESULT_BYTE_COUNT,
};
pub use presence::{
    step, Action, PresenceMonitor, PresenceState, PresenceThresholds, MAX_TIMEOUT_COUNT,
};
