//! Transparency log of what the agent saw and did.
//!
//! Only counts are kept. Faces, boxes and identities are never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current and previous sessions.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Sensor results read from the bus
    frames_polled: AtomicU64,
    /// Frames in which the user was seen
    frames_with_main_face: AtomicU64,
    /// Frames in which an onlooker was seen
    frames_with_lookie_loo: AtomicU64,
    /// Frames whose checksum did not match
    checksum_mismatches: AtomicU64,
    /// Frames dropped before reaching the state machine
    frames_discarded: AtomicU64,
    /// Lock chords sent
    locks_sent: AtomicU64,
    /// Minimize chords sent
    minimizes_sent: AtomicU64,
    /// Chords that failed to send
    dispatch_failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            frames_polled: AtomicU64::new(0),
            frames_with_main_face: AtomicU64::new(0),
            frames_with_lookie_loo: AtomicU64::new(0),
            checksum_mismatches: AtomicU64::new(0),
            frames_discarded: AtomicU64::new(0),
            locks_sent: AtomicU64::new(0),
            minimizes_sent: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log that loads from and saves to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous statistics: {e}");
        }

        log
    }

    pub fn record_frame_polled(&self) {
        self.frames_polled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_main_face(&self) {
        self.frames_with_main_face.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookie_loo(&self) {
        self.frames_with_lookie_loo.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the mismatch count including this one.
    pub fn record_checksum_mismatch(&self) -> u64 {
        self.checksum_mismatches.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_frame_discarded(&self) {
        self.frames_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lock_sent(&self) {
        self.locks_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_minimize_sent(&self) {
        self.minimizes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            frames_polled: self.frames_polled.load(Ordering::Relaxed),
            frames_with_main_face: self.frames_with_main_face.load(Ordering::Relaxed),
            frames_with_lookie_loo: self.frames_with_lookie_loo.load(Ordering::Relaxed),
            checksum_mismatches: self.checksum_mismatches.load(Ordering::Relaxed),
            frames_discarded: self.frames_discarded.load(Ordering::Relaxed),
            locks_sent: self.locks_sent.load(Ordering::Relaxed),
            minimizes_sent: self.minimizes_sent.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Frames polled: {}\n\
             - Frames with you in view: {}\n\
             - Frames with an onlooker: {}\n\
             - Checksum mismatches: {} ({} frames discarded)\n\
             - Screen locks sent: {}\n\
             - Minimizes sent: {}\n\
             - Failed sends: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - No images leave the sensor\n\
             - No face boxes or identities are stored\n\
             - Only counts are retained",
            stats.frames_polled,
            stats.frames_with_main_face,
            stats.frames_with_lookie_loo,
            stats.checksum_mismatches,
            stats.frames_discarded,
            stats.locks_sent,
            stats.minimizes_sent,
            stats.dispatch_failures,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                frames_polled: stats.frames_polled,
                frames_with_main_face: stats.frames_with_main_face,
                frames_with_lookie_loo: stats.frames_with_lookie_loo,
                checksum_mismatches: stats.checksum_mismatches,
                frames_discarded: stats.frames_discarded,
                locks_sent: stats.locks_sent,
                minimizes_sent: stats.minimizes_sent,
                dispatch_failures: stats.dispatch_failures,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let persisted = read_persisted(path)?;

                self.frames_polled
                    .store(persisted.frames_polled, Ordering::Relaxed);
                self.frames_with_main_face
                    .store(persisted.frames_with_main_face, Ordering::Relaxed);
                self.frames_with_lookie_loo
                    .store(persisted.frames_with_lookie_loo, Ordering::Relaxed);
                self.checksum_mismatches
                    .store(persisted.checksum_mismatches, Ordering::Relaxed);
                self.frames_discarded
                    .store(persisted.frames_discarded, Ordering::Relaxed);
                self.locks_sent.store(persisted.locks_sent, Ordering::Relaxed);
                self.minimizes_sent
                    .store(persisted.minimizes_sent, Ordering::Relaxed);
                self.dispatch_failures
                    .store(persisted.dispatch_failures, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub frames_polled: u64,
    pub frames_with_main_face: u64,
    pub frames_with_lookie_loo: u64,
    pub checksum_mismatches: u64,
    pub frames_discarded: u64,
    pub locks_sent: u64,
    pub minimizes_sent: u64,
    pub dispatch_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedStats {
    pub frames_polled: u64,
    pub frames_with_main_face: u64,
    pub frames_with_lookie_loo: u64,
    pub checksum_mismatches: u64,
    pub frames_discarded: u64,
    pub locks_sent: u64,
    pub minimizes_sent: u64,
    pub dispatch_failures: u64,
    pub last_updated: DateTime<Utc>,
}

/// Read a persisted stats file, e.g. for `status`.
pub fn read_persisted(path: &std::path::Path) -> Result<PersistedStats, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(std::io::Error::other)
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}
