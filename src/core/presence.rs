//! Presence and attention state machine.
//!
//! Two independent debounce counters are kept across polls:
//!
//! - `frames_since_main_face_seen` counts up while the user is absent and
//!   resets when they are seen.
//! - `frames_since_lookie_loo_seen` counts up while an onlooker is present
//!   and resets when none is seen.
//!
//! An action fires only on the poll where a counter becomes equal to its
//! threshold, so each continuous episode produces at most one action.

use crate::core::classifier::Classification;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Something the host should do in response to a presence change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    LockScreen,
    MinimizeScreen,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::LockScreen => write!(f, "lock screen"),
            Action::MinimizeScreen => write!(f, "minimize screen"),
        }
    }
}

/// Counter state carried from one poll to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceState {
    pub frames_since_main_face_seen: u32,
    pub frames_since_lookie_loo_seen: u32,
}

/// Poll counts at which actions fire.
///
/// Both must be between 1 and [`MAX_TIMEOUT_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceThresholds {
    pub main_face_timeout_count: u32,
    pub lookie_loo_timeout_count: u32,
}

impl PresenceThresholds {
    /// Derive poll counts from wall-clock timeouts.
    ///
    /// Returns `None` if either timeout spans more than
    /// [`MAX_TIMEOUT_COUNT`] polls.
    pub fn from_timeouts(
        main_face_timeout: Duration,
        lookie_loo_timeout: Duration,
        poll_interval: Duration,
    ) -> Option<Self> {
        Some(Self {
            main_face_timeout_count: timeout_count(main_face_timeout, poll_interval)?,
            lookie_loo_timeout_count: timeout_count(lookie_loo_timeout, poll_interval)?,
        })
    }
}

impl Default for PresenceThresholds {
    fn default() -> Self {
        Self {
            main_face_timeout_count: 25,
            lookie_loo_timeout_count: 5,
        }
    }
}

/// Largest usable threshold.
///
/// Counters saturate at `u32::MAX`, so a threshold there would match on
/// every poll once reached.
pub const MAX_TIMEOUT_COUNT: u32 = u32::MAX - 1;

/// Number of whole poll intervals in `timeout`, truncated.
///
/// Returns 0 for a zero poll interval and `None` when the count exceeds
/// [`MAX_TIMEOUT_COUNT`]; callers validate both.
pub fn timeout_count(timeout: Duration, poll_interval: Duration) -> Option<u32> {
    let interval = poll_interval.as_micros();
    if interval == 0 {
        return Some(0);
    }
    u32::try_from(timeout.as_micros() / interval)
        .ok()
        .filter(|&count| count <= MAX_TIMEOUT_COUNT)
}

/// Advance the counters by one poll.
///
/// Returns the new state and the action whose threshold was hit on this
/// exact poll, if any. A counter only fires on the poll where it moves onto
/// its threshold, so a saturated counter never refires.
///
/// Only one action is returned per poll. If both counters reach their
/// thresholds together, `LockScreen` is returned and the minimize is
/// dropped. The classifier never reports an onlooker without a main face,
/// so this needs hand-built input.
pub fn step(
    state: PresenceState,
    observed: Classification,
    thresholds: &PresenceThresholds,
) -> (PresenceState, Option<Action>) {
    let next = PresenceState {
        frames_since_main_face_seen: if observed.has_main_face {
            0
        } else {
            state.frames_since_main_face_seen.saturating_add(1)
        },
        frames_since_lookie_loo_seen: if observed.has_lookie_loo {
            state.frames_since_lookie_loo_seen.saturating_add(1)
        } else {
            0
        },
    };

    let lock = next.frames_since_main_face_seen != state.frames_since_main_face_seen
        && next.frames_since_main_face_seen == thresholds.main_face_timeout_count;
    let minimize = next.frames_since_lookie_loo_seen != state.frames_since_lookie_loo_seen
        && next.frames_since_lookie_loo_seen == thresholds.lookie_loo_timeout_count;

    let action = if lock {
        Some(Action::LockScreen)
    } else if minimize {
        Some(Action::MinimizeScreen)
    } else {
        None
    };

    (next, action)
}

/// Owns the presence state for a running agent.
#[derive(Debug, Clone)]
pub struct PresenceMonitor {
    state: PresenceState,
    thresholds: PresenceThresholds,
}

impl PresenceMonitor {
    pub fn new(thresholds: PresenceThresholds) -> Self {
        Self {
            state: PresenceState::default(),
            thresholds,
        }
    }

    /// Feed one frame's classification.
    pub fn observe(&mut self, observed: Classification) -> Option<Action> {
        let (next, action) = step(self.state, observed, &self.thresholds);
        self.state = next;
        action
    }

    /// Forget any episode in progress.
    pub fn reset(&mut self) {
        self.state = PresenceState::default();
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABSENT: Classification = Classification {
        has_main_face: false,
        has_lookie_loo: false,
    };
    const PRESENT: Classification = Classification {
        has_main_face: true,
        has_lookie_loo: false,
    };
    const WATCHED: Classification = Classification {
        has_main_face: true,
        has_lookie_loo: true,
    };

    fn thresholds(main: u32, lookie: u32) -> PresenceThresholds {
        PresenceThresholds {
            main_face_timeout_count: main,
            lookie_loo_timeout_count: lookie,
        }
    }

    #[test]
    fn test_default_thresholds() {
        let t = PresenceThresholds::default();
        assert_eq!(t.main_face_timeout_count, 25);
        assert_eq!(t.lookie_loo_timeout_count, 5);
        assert_eq!(
            PresenceThresholds::from_timeouts(
                Duration::from_secs(5),
                Duration::from_secs(1),
                Duration::from_millis(200),
            ),
            Some(t)
        );
    }

    #[test]
    fn test_timeout_count_truncates() {
        let poll = Duration::from_millis(200);
        assert_eq!(timeout_count(Duration::from_millis(999), poll), Some(4));
        assert_eq!(timeout_count(Duration::from_millis(1000), poll), Some(5));
        assert_eq!(timeout_count(Duration::from_millis(150), poll), Some(0));
        assert_eq!(timeout_count(Duration::from_secs(1), Duration::ZERO), Some(0));
    }

    #[test]
    fn test_timeout_count_rejects_saturating_counts() {
        let poll = Duration::from_millis(1);
        assert_eq!(
            timeout_count(Duration::from_millis(u64::from(MAX_TIMEOUT_COUNT)), poll),
            Some(MAX_TIMEOUT_COUNT)
        );
        assert_eq!(
            timeout_count(Duration::from_millis(u64::from(u32::MAX)), poll),
            None
        );
        assert_eq!(timeout_count(Duration::from_millis(u64::MAX / 2), poll), None);
        assert_eq!(
            PresenceThresholds::from_timeouts(
                Duration::from_millis(u64::MAX / 2),
                Duration::from_secs(1),
                poll,
            ),
            None
        );
    }

    #[test]
    fn test_main_counter_counts_absence_and_resets() {
        let t = thresholds(100, 100);
        let mut state = PresenceState::default();
        for expected in 1..=10 {
            state = step(state, ABSENT, &t).0;
            assert_eq!(state.frames_since_main_face_seen, expected);
        }
        state = step(state, PRESENT, &t).0;
        assert_eq!(state.frames_since_main_face_seen, 0);
    }

    #[test]
    fn test_lookie_counter_counts_presence_and_resets() {
        let t = thresholds(100, 100);
        let mut state = PresenceState::default();
        for expected in 1..=3 {
            state = step(state, WATCHED, &t).0;
            assert_eq!(state.frames_since_lookie_loo_seen, expected);
        }
        state = step(state, PRESENT, &t).0;
        assert_eq!(state.frames_since_lookie_loo_seen, 0);
    }

    #[test]
    fn test_lock_fires_once_on_exact_poll() {
        let mut monitor = PresenceMonitor::new(PresenceThresholds::default());
        let mut fired = Vec::new();
        for i in 1..=60 {
            if let Some(action) = monitor.observe(ABSENT) {
                fired.push((i, action));
            }
        }
        assert_eq!(fired, vec![(25, Action::LockScreen)]);
        assert_eq!(monitor.state().frames_since_main_face_seen, 60);
    }

    #[test]
    fn test_lock_refires_after_new_episode() {
        let mut monitor = PresenceMonitor::new(thresholds(3, 100));
        let mut actions = Vec::new();
        for observed in [ABSENT, ABSENT, ABSENT, ABSENT, PRESENT, ABSENT, ABSENT, ABSENT] {
            actions.push(monitor.observe(observed));
        }
        assert_eq!(
            actions,
            vec![
                None,
                None,
                Some(Action::LockScreen),
                None,
                None,
                None,
                None,
                Some(Action::LockScreen)
            ]
        );
    }

    #[test]
    fn test_short_absence_never_locks() {
        let mut monitor = PresenceMonitor::new(thresholds(5, 100));
        for _ in 0..10 {
            for _ in 0..4 {
                assert_eq!(monitor.observe(ABSENT), None);
            }
            assert_eq!(monitor.observe(PRESENT), None);
        }
    }

    #[test]
    fn test_minimize_fires_once_per_onlooker_episode() {
        let mut monitor = PresenceMonitor::new(PresenceThresholds::default());
        let mut fired = Vec::new();
        for i in 1..=20 {
            if let Some(action) = monitor.observe(WATCHED) {
                fired.push((i, action));
            }
        }
        assert_eq!(fired, vec![(5, Action::MinimizeScreen)]);

        monitor.observe(PRESENT);
        for _ in 0..4 {
            assert_eq!(monitor.observe(WATCHED), None);
        }
        assert_eq!(monitor.observe(WATCHED), Some(Action::MinimizeScreen));
    }

    #[test]
    fn test_lock_wins_when_both_edges_coincide() {
        let t = thresholds(1, 1);
        let odd = Classification {
            has_main_face: false,
            has_lookie_loo: true,
        };
        let (_, action) = step(PresenceState::default(), odd, &t);
        assert_eq!(action, Some(Action::LockScreen));
    }

    #[test]
    fn test_counters_saturate() {
        let t = thresholds(5, 5);
        let state = PresenceState {
            frames_since_main_face_seen: u32::MAX,
            frames_since_lookie_loo_seen: 0,
        };
        let (next, action) = step(state, ABSENT, &t);
        assert_eq!(next.frames_since_main_face_seen, u32::MAX);
        assert_eq!(action, None);
    }

    #[test]
    fn test_saturated_counter_does_not_refire() {
        let t = thresholds(u32::MAX, u32::MAX);
        let mut state = PresenceState {
            frames_since_main_face_seen: u32::MAX - 1,
            frames_since_lookie_loo_seen: u32::MAX - 1,
        };
        let mut locks = 0;
        for _ in 0..5 {
            let (next, action) = step(state, ABSENT, &t);
            if action == Some(Action::LockScreen) {
                locks += 1;
            }
            state = next;
        }
        assert_eq!(locks, 1);

        state.frames_since_lookie_loo_seen = u32::MAX - 1;
        let mut minimizes = 0;
        for _ in 0..5 {
            let (next, action) = step(state, WATCHED, &t);
            if action == Some(Action::MinimizeScreen) {
                minimizes += 1;
            }
            state = next;
        }
        assert_eq!(state.frames_since_lookie_loo_seen, u32::MAX);
        assert_eq!(minimizes, 1);
    }

    #[test]
    fn test_reset_clears_episode() {
        let mut monitor = PresenceMonitor::new(thresholds(3, 100));
        monitor.observe(ABSENT);
        monitor.observe(ABSENT);
        monitor.reset();
        assert_eq!(monitor.state(), PresenceState::default());
        assert_eq!(monitor.observe(ABSENT), None);
    }
}
