//! Synthetic keyboard output for the presence lock agent.
//!
//! Actions are delivered as key chords through a [`KeySender`]. A USB gadget
//! keyboard presses them on the attached host; the log-only sender is used
//! for dry runs.

pub mod gadget;
pub mod noop;
pub mod types;

// Re-export commonly used types
pub use gadget::GadgetKeyboard;
pub use noop::LogOnlySender;
pub use types::{HidError, Key, KeyChord, KeySender, Platform};
