//! One poll of the sensor, end to end.
//!
//! Each tick reads a raw result, decodes and classifies it, advances the
//! presence state machine, and dispatches any action that fired. Pacing,
//! pausing and shutdown are left to the caller.

use crate::bus::{BusError, FrameSource};
use crate::config::{ChecksumPolicy, Config, ConfigError};
use crate::core::{
    classify, decode, verify_checksum, Action, Classification, ClassifierConfig, DecodeError,
    PresenceMonitor, PresenceState, PresenceThresholds,
};
use crate::dispatch::ActionDispatcher;
use crate::hid::KeySender;
use crate::transparency::SharedTransparencyLog;

/// Checksum warnings after the first are logged once per this many mismatches.
const CHECKSUM_WARN_EVERY: u64 = 100;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame was classified and fed to the state machine.
    Observed {
        classification: Classification,
        action: Option<Action>,
    },
    /// The frame failed its checksum and was dropped.
    Discarded,
}

/// Errors that stop the agent.
#[derive(Debug)]
pub enum AgentError {
    Bus(BusError),
    Decode(DecodeError),
}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::Bus(e) => write!(f, "{e}"),
            AgentError::Decode(e) => write!(f, "Protocol error: {e}"),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::Bus(e) => Some(e),
            AgentError::Decode(e) => Some(e),
        }
    }
}

impl From<BusError> for AgentError {
    fn from(e: BusError) -> Self {
        AgentError::Bus(e)
    }
}

impl From<DecodeError> for AgentError {
    fn from(e: DecodeError) -> Self {
        AgentError::Decode(e)
    }
}

/// Settings the agent needs from the configuration.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub classifier: ClassifierConfig,
    pub thresholds: PresenceThresholds,
    pub checksum_policy: ChecksumPolicy,
}

impl AgentSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            classifier: config.classifier.clone(),
            thresholds: config.presence_thresholds()?,
            checksum_policy: config.checksum_policy,
        })
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            thresholds: PresenceThresholds::default(),
            checksum_policy: ChecksumPolicy::default(),
        }
    }
}

/// Drives frames from a source through to key chords.
pub struct PresenceAgent<S, K> {
    source: S,
    dispatcher: ActionDispatcher<K>,
    monitor: PresenceMonitor,
    classifier: ClassifierConfig,
    checksum_policy: ChecksumPolicy,
    log: SharedTransparencyLog,
}

impl<S: FrameSource, K: KeySender> PresenceAgent<S, K> {
    pub fn new(
        source: S,
        dispatcher: ActionDispatcher<K>,
        settings: AgentSettings,
        log: SharedTransparencyLog,
    ) -> Self {
        Self {
            source,
            dispatcher,
            monitor: PresenceMonitor::new(settings.thresholds),
            classifier: settings.classifier,
            checksum_policy: settings.checksum_policy,
            log,
        }
    }

    /// Poll the sensor once.
    ///
    /// Bus and decode failures are returned; the agent cannot recover from
    /// them without resetting the bus. A failed key send is logged and
    /// counted but does not fail the tick.
    pub fn tick(&mut self) -> Result<TickOutcome, AgentError> {
        let raw = self.source.read_raw()?;
        self.log.record_frame_polled();

        let frame = decode(&raw)?;

        if self.checksum_policy != ChecksumPolicy::Ignore {
            if let Err(e) = verify_checksum(&raw) {
                let mismatches = self.log.record_checksum_mismatch();
                if mismatches == 1 || mismatches % CHECKSUM_WARN_EVERY == 0 {
                    tracing::warn!(mismatches, "{e}");
                } else {
                    tracing::debug!("{e}");
                }

                if self.checksum_policy == ChecksumPolicy::Discard {
                    self.log.record_frame_discarded();
                    return Ok(TickOutcome::Discarded);
                }
            }
        }

        for (i, face) in frame.faces.iter().enumerate() {
            tracing::trace!(
                index = i,
                confidence = face.box_confidence,
                width = face.width(),
                height = face.height(),
                facing = face.is_facing(),
                "Face"
            );
        }

        let classification = classify(&frame, &self.classifier);
        if classification.has_main_face {
            self.log.record_main_face();
        }
        if classification.has_lookie_loo {
            self.log.record_lookie_loo();
        }

        let action = self.monitor.observe(classification);
        let state = self.monitor.state();
        tracing::debug!(
            faces = frame.faces.len(),
            main_face = classification.has_main_face,
            lookie_loo = classification.has_lookie_loo,
            absent_for = state.frames_since_main_face_seen,
            watched_for = state.frames_since_lookie_loo_seen,
            "Frame"
        );

        if let Some(action) = action {
            self.dispatch(action);
        }

        Ok(TickOutcome::Observed {
            classification,
            action,
        })
    }

    fn dispatch(&mut self, action: Action) {
        match self.dispatcher.dispatch(action) {
            Ok(()) => match action {
                Action::LockScreen => self.log.record_lock_sent(),
                Action::MinimizeScreen => self.log.record_minimize_sent(),
            },
            Err(e) => {
                self.log.record_dispatch_failure();
                tracing::error!(%action, "Could not send key chord: {e}");
            }
        }
    }

    /// Forget any episode in progress, e.g. after a pause.
    pub fn reset(&mut self) {
        self.monitor.reset();
    }

    pub fn state(&self) -> PresenceState {
        self.monitor.state()
    }

    pub fn dispatcher(&self) -> &ActionDispatcher<K> {
        &self.dispatcher
    }
}
