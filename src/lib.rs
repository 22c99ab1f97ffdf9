//! Presence Lock - locks or hides your screen based on a Person Sensor.
//!
//! A Person Sensor on an I2C bus reports up to four detected faces several
//! times a second. This library decodes those reports, decides whether the
//! primary user is present and whether someone else is looking, and sends
//! key chords to the host when either condition persists long enough.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Presence Lock Agent                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌────────┐ │
//! │  │    Bus    │──▶│  Decoder  │──▶│ Classifier │──▶│Presence│ │
//! │  │ (I2C 0x62)│   │ (39 bytes)│   │(main/onlk.)│   │counters│ │
//! │  └───────────┘   └───────────┘   └────────────┘   └────────┘ │
//! │                                                       │      │
//! │  ┌─────────────┐                  ┌────────────┐      │      │
//! │  │Transparency │◀─────────────────│ Dispatcher │◀─────┘      │
//! │  │    Log      │                  │ (HID keys) │             │
//! │  └─────────────┘                  └────────────┘             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use presence_lock::{
//!     bus::ReplaySource, dispatch::ActionDispatcher, hid::LogOnlySender, hid::Platform,
//!     transparency::create_shared_log, AgentSettings, PresenceAgent,
//! };
//!
//! let source = ReplaySource::from_frames(vec![vec![0u8; 39]; 30], false);
//! let dispatcher = ActionDispatcher::new(LogOnlySender::new(), Platform::Windows);
//! let mut agent = PresenceAgent::new(
//!     source,
//!     dispatcher,
//!     AgentSettings::default(),
//!     create_shared_log(),
//! );
//!
//! while let Ok(outcome) = agent.tick() {
//!     println!("{outcome:?}");
//! }
//! ```

pub mod agent;
pub mod bus;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod hid;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use agent::{AgentError, AgentSettings, PresenceAgent, TickOutcome};
pub use bus::{BusError, FrameSource};
pub use config::{ChecksumPolicy, Config};
pub use self::core::{
    classify, decode, step, Action, Classification, ClassifierConfig, DecodeError, FaceRecord,
    Frame, PresenceMonitor, PresenceState, PresenceThresholds,
};
pub use dispatch::ActionDispatcher;
pub use hid::{KeyChord, KeySender, Platform};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║               PRESENCE LOCK - PRIVACY DECLARATION                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent watches for faces to protect your screen.            ║
║                                                                  ║
║  ✓ WHAT THE SENSOR REPORTS:                                      ║
║    • Up to four face boxes per reading                           ║
║    • Detection confidence and whether each face looks at you     ║
║                                                                  ║
║  ✗ WHAT NEVER LEAVES THE SENSOR:                                 ║
║    • Camera images or video                                      ║
║                                                                  ║
║  ✗ WHAT THE AGENT NEVER STORES:                                  ║
║    • Face boxes, identities or timestamps of sightings           ║
║                                                                  ║
║  Only counts (frames polled, locks sent, ...) are kept.          ║
║                                                                  ║
║  You can view these counts anytime with:                         ║
║    presence-lock status                                          ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
