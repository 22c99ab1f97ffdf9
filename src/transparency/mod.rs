//! Transparency module for the presence lock agent.
//!
//! This module keeps auditable counts of what the agent observed and which
//! actions it took, without retaining anything about the faces themselves.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, read_persisted, PersistedStats,
    SharedTransparencyLog, TransparencyLog, TransparencyStats,
};
