//! Turns presence actions into key chords.

use crate::core::Action;
use crate::hid::{HidError, KeyChord, KeySender, Platform};

/// Sends the platform's chord for each action.
///
/// Dispatch is fire-and-forget: there is no way to confirm the host locked
/// or minimized, and failed sends are not retried.
pub struct ActionDispatcher<K> {
    sender: K,
    platform: Platform,
}

impl<K: KeySender> ActionDispatcher<K> {
    pub fn new(sender: K, platform: Platform) -> Self {
        Self { sender, platform }
    }

    /// Chord used for an action on the configured platform.
    pub fn chord_for(&self, action: Action) -> KeyChord {
        match action {
            Action::LockScreen => self.platform.lock_chord(),
            Action::MinimizeScreen => self.platform.minimize_chord(),
        }
    }

    /// Send the chord for `action`.
    pub fn dispatch(&mut self, action: Action) -> Result<(), HidError> {
        let chord = self.chord_for(action);
        match action {
            Action::LockScreen => tracing::info!(chord = %chord, "Locking!"),
            Action::MinimizeScreen => tracing::info!(chord = %chord, "Minimizing!"),
        }
        self.sender.send_chord(&chord)
    }

    pub fn sender(&self) -> &K {
        &self.sender
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::Key;

    #[derive(Default)]
    struct Recorder {
        chords: Vec<KeyChord>,
    }

    impl KeySender for Recorder {
        fn send_chord(&mut self, chord: &KeyChord) -> Result<(), HidError> {
            self.chords.push(chord.clone());
            Ok(())
        }
    }

    struct Unplugged;

    impl KeySender for Unplugged {
        fn send_chord(&mut self, _chord: &KeyChord) -> Result<(), HidError> {
            Err(HidError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "host disconnected",
            )))
        }
    }

    #[test]
    fn test_dispatch_sends_platform_chords() {
        let mut dispatcher = ActionDispatcher::new(Recorder::default(), Platform::Windows);
        dispatcher.dispatch(Action::LockScreen).unwrap();
        dispatcher.dispatch(Action::MinimizeScreen).unwrap();

        assert_eq!(
            dispatcher.sender().chords,
            vec![
                KeyChord::new(&[Key::Gui, Key::L]),
                KeyChord::new(&[Key::Gui, Key::M])
            ]
        );
    }

    #[test]
    fn test_platform_selects_lock_chord() {
        let dispatcher = ActionDispatcher::new(Recorder::default(), Platform::Popos);
        assert_eq!(
            dispatcher.chord_for(Action::LockScreen),
            KeyChord::new(&[Key::Gui, Key::Escape])
        );
    }

    #[test]
    fn test_send_failure_is_returned() {
        let mut dispatcher = ActionDispatcher::new(Unplugged, Platform::Windows);
        assert!(dispatcher.dispatch(Action::LockScreen).is_err());
    }
}
