//! Key chords and the outbound keyboard abstraction.

use serde::{Deserialize, Serialize};

/// Keys the agent knows how to press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Control,
    Shift,
    Alt,
    /// Windows / Command / Super key
    Gui,
    Escape,
    L,
    M,
}

impl Key {
    /// HID modifier bit for modifier keys.
    pub fn modifier_bit(self) -> Option<u8> {
        match self {
            Key::Control => Some(0x01),
            Key::Shift => Some(0x02),
            Key::Alt => Some(0x04),
            Key::Gui => Some(0x08),
            _ => None,
        }
    }

    /// HID keyboard usage ID for ordinary keys.
    pub fn usage_id(self) -> Option<u8> {
        match self {
            Key::L => Some(0x0F),
            Key::M => Some(0x10),
            Key::Escape => Some(0x29),
            _ => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Key::Control => "Ctrl",
            Key::Shift => "Shift",
            Key::Alt => "Alt",
            Key::Gui => "Meta",
            Key::Escape => "Esc",
            Key::L => "L",
            Key::M => "M",
        };
        f.write_str(name)
    }
}

/// Keys pressed together, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChord(pub Vec<Key>);

impl KeyChord {
    pub fn new(keys: &[Key]) -> Self {
        Self(keys.to_vec())
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }
}

impl std::fmt::Display for KeyChord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Host operating system, which decides the key chords sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Windows,
    Macos,
    /// Pop!_OS and other GNOME desktops
    Popos,
}

impl Platform {
    /// Chord that locks the screen.
    pub fn lock_chord(self) -> KeyChord {
        match self {
            Platform::Windows => KeyChord::new(&[Key::Gui, Key::L]),
            Platform::Macos => KeyChord::new(&[Key::Control, Key::Gui, Key::Escape]),
            Platform::Popos => KeyChord::new(&[Key::Gui, Key::Escape]),
        }
    }

    /// Chord that minimizes or hides the foreground window.
    pub fn minimize_chord(self) -> KeyChord {
        KeyChord::new(&[Key::Gui, Key::M])
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" | "win" => Ok(Platform::Windows),
            "macos" | "mac" => Ok(Platform::Macos),
            "popos" | "linux" | "gnome" => Ok(Platform::Popos),
            other => Err(format!(
                "unknown platform '{other}' (expected windows, macos or popos)"
            )),
        }
    }
}

/// Destination for synthetic key chords.
pub trait KeySender {
    fn send_chord(&mut self, chord: &KeyChord) -> Result<(), HidError>;
}

impl<K: KeySender + ?Sized> KeySender for Box<K> {
    fn send_chord(&mut self, chord: &KeyChord) -> Result<(), HidError> {
        (**self).send_chord(chord)
    }
}

/// Errors that can occur while sending key chords.
#[derive(Debug)]
pub enum HidError {
    /// The HID device could not be opened.
    Open { device: String, reason: String },
    /// Writing a report failed.
    Write(std::io::Error),
    /// More keys than a boot keyboard report can carry.
    TooManyKeys(usize),
}

impl std::fmt::Display for HidError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HidError::Open { device, reason } => write!(f, "Could not open {device}: {reason}"),
            HidError::Write(e) => write!(f, "HID write failed: {e}"),
            HidError::TooManyKeys(n) => write!(f, "Chord has {n} keys, at most 6 fit a report"),
        }
    }
}

impl std::error::Error for HidError {}
