//! Replays captured sensor results from a text file.
//!
//! One result per line, written as hex. Whitespace inside a line is ignored
//! and lines starting with `#` are comments. This lets the agent run and be
//! tested without a sensor attached.

use crate::bus::types::{BusError, FrameSource};
use std::path::Path;

/// A frame source backed by an in-memory capture.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    frames: Vec<Vec<u8>>,
    looped: bool,
    next: usize,
}

impl ReplaySource {
    pub fn from_frames(frames: Vec<Vec<u8>>, looped: bool) -> Self {
        Self {
            frames,
            looped,
            next: 0,
        }
    }

    /// Load a capture file.
    pub fn from_path(path: &Path, looped: bool) -> Result<Self, BusError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BusError::Replay(format!("{}: {e}", path.display())))?;
        Self::parse(&content, looped)
    }

    /// Parse capture text.
    pub fn parse(content: &str, looped: bool) -> Result<Self, BusError> {
        let frames = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .map(|(number, line)| {
                parse_hex(line).map_err(|e| BusError::Replay(format!("line {number}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if frames.is_empty() {
            return Err(BusError::Replay("capture contains no frames".to_string()));
        }

        Ok(Self::from_frames(frames, looped))
    }

    /// Number of frames in the capture.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ReplaySource {
    fn read_raw(&mut self) -> Result<Vec<u8>, BusError> {
        if self.next >= self.frames.len() {
            if !self.looped || self.frames.is_empty() {
                return Err(BusError::Exhausted);
            }
            self.next = 0;
        }
        let frame = self.frames[self.next].clone();
        self.next += 1;
        Ok(frame)
    }
}

/// Parse a hex string such as `"00 00 23 00 01 ..."` into bytes.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let byte: String = pair.iter().collect();
            u8::from_str_radix(&byte, 16).map_err(|_| format!("invalid hex byte {byte:?}"))
        })
        .collect()
}

/// Format bytes as space-separated hex, the inverse of [`parse_hex`].
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("00ff 1A").unwrap(), vec![0x00, 0xFF, 0x1A]);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn test_hex_formatting() {
        assert_eq!(to_hex(&[0x00, 0xAB, 0x10]), "00 ab 10");
        assert_eq!(parse_hex(&to_hex(&[1, 2, 3])).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let capture = "# empty room\n\n0000\n  # still empty\n0101\n";
        let mut replay = ReplaySource::parse(capture, false).unwrap();
        assert_eq!(replay.len(), 2);
        assert_eq!(replay.read_raw().unwrap(), vec![0, 0]);
        assert_eq!(replay.read_raw().unwrap(), vec![1, 1]);
        assert_eq!(replay.read_raw(), Err(BusError::Exhausted));
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = ReplaySource::parse("00\n0g\n", false).unwrap_err();
        match err {
            BusError::Replay(msg) => assert!(msg.starts_with("line 2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_capture_is_rejected() {
        assert!(ReplaySource::parse("# nothing\n", true).is_err());
    }

    #[test]
    fn test_looped_replay_wraps_around() {
        let mut replay = ReplaySource::from_frames(vec![vec![1], vec![2]], true);
        let seen: Vec<u8> = (0..5).map(|_| replay.read_raw().unwrap()[0]).collect();
        assert_eq!(seen, vec![1, 2, 1, 2, 1]);
    }
}
