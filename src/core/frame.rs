//! Person Sensor result frame decoding.
//!
//! One bus read returns a fixed 39-byte result:
//!
//! ```text
//! offset  width  field
//!      0      1  pad1 (reserved/status)
//!      1      1  pad2 (reserved/status)
//!      2      2  payload_bytes (u16 LE)
//!      4      1  num_faces (0-4)
//!      5   4x 8  face slots, only the first num_faces are valid
//!     37      2  checksum (u16 LE)
//! ```

use serde::{Deserialize, Serialize};

/// Bytes in the header: two pad bytes and the payload length.
pub const HEADER_BYTE_COUNT: usize = 4;

/// Bytes in one face record.
pub const FACE_BYTE_COUNT: usize = 8;

/// Number of face slots in every frame, valid or not.
pub const MAX_FACES: usize = 4;

/// Bytes in the trailing checksum.
pub const CHECKSUM_BYTE_COUNT: usize = 2;

/// Total size of one sensor result.
pub const RESULT_BYTE_COUNT: usize =
    HEADER_BYTE_COUNT + 1 + FACE_BYTE_COUNT * MAX_FACES + CHECKSUM_BYTE_COUNT;

const NUM_FACES_OFFSET: usize = HEADER_BYTE_COUNT;
const FACES_OFFSET: usize = NUM_FACES_OFFSET + 1;
const CHECKSUM_OFFSET: usize = RESULT_BYTE_COUNT - CHECKSUM_BYTE_COUNT;

/// A single detected face as reported by the sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub box_confidence: u8,
    pub box_left: u8,
    pub box_top: u8,
    pub box_right: u8,
    pub box_bottom: u8,
    pub id_confidence: u8,
    /// Recognized identity slot, negative when unknown.
    pub id: i8,
    /// Nonzero when the face is looking at the camera.
    pub is_facing: u8,
}

impl FaceRecord {
    fn from_slot(slot: &[u8]) -> Self {
        Self {
            box_confidence: slot[0],
            box_left: slot[1],
            box_top: slot[2],
            box_right: slot[3],
            box_bottom: slot[4],
            id_confidence: slot[5],
            id: slot[6] as i8,
            is_facing: slot[7],
        }
    }

    fn write_slot(&self, slot: &mut [u8]) {
        slot[0] = self.box_confidence;
        slot[1] = self.box_left;
        slot[2] = self.box_top;
        slot[3] = self.box_right;
        slot[4] = self.box_bottom;
        slot[5] = self.id_confidence;
        slot[6] = self.id as u8;
        slot[7] = self.is_facing;
    }

    /// Box width in sensor pixels. Inverted boxes give a non-positive width.
    pub fn width(&self) -> i16 {
        i16::from(self.box_right) - i16::from(self.box_left)
    }

    /// Box height in sensor pixels. Inverted boxes give a non-positive height.
    pub fn height(&self) -> i16 {
        i16::from(self.box_bottom) - i16::from(self.box_top)
    }

    pub fn is_facing(&self) -> bool {
        self.is_facing != 0
    }
}

/// A decoded sensor result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub pad1: u8,
    pub pad2: u8,
    /// Payload length as declared by the sensor. Not validated.
    pub payload_bytes: u16,
    /// Valid faces in detection order. Order is not stable between polls.
    pub faces: Vec<FaceRecord>,
    /// Checksum field exactly as read.
    pub checksum: u16,
}

impl Frame {
    /// Re-encode into the 39-byte wire layout.
    ///
    /// Unused face slots are zeroed and the stored checksum is written as-is,
    /// so a decoded frame encodes back to the same field values. Faces beyond
    /// the fourth are dropped.
    pub fn to_bytes(&self) -> [u8; RESULT_BYTE_COUNT] {
        let mut buf = [0u8; RESULT_BYTE_COUNT];
        buf[0] = self.pad1;
        buf[1] = self.pad2;
        buf[2..4].copy_from_slice(&self.payload_bytes.to_le_bytes());

        let count = self.faces.len().min(MAX_FACES);
        buf[NUM_FACES_OFFSET] = count as u8;
        for (i, face) in self.faces.iter().take(count).enumerate() {
            let start = FACES_OFFSET + i * FACE_BYTE_COUNT;
            face.write_slot(&mut buf[start..start + FACE_BYTE_COUNT]);
        }

        buf[CHECKSUM_OFFSET..].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }
}

/// Errors raised while decoding a raw result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than one full result.
    ShortBuffer { expected: usize, actual: usize },
    /// More bytes than one full result.
    LengthMismatch { expected: usize, actual: usize },
    /// Face count larger than the number of slots.
    TooManyFaces(u8),
    /// Checksum field disagrees with the computed CRC.
    ChecksumMismatch { expected: u16, actual: u16 },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::ShortBuffer { expected, actual } => {
                write!(f, "Short buffer: expected {expected} bytes, got {actual}")
            }
            DecodeError::LengthMismatch { expected, actual } => {
                write!(f, "Length mismatch: expected {expected} bytes, got {actual}")
            }
            DecodeError::TooManyFaces(n) => {
                write!(f, "Face count {n} exceeds the {MAX_FACES} available slots")
            }
            DecodeError::ChecksumMismatch { expected, actual } => write!(
                f,
                "Checksum mismatch: computed {expected:#06x}, frame carries {actual:#06x}"
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode one raw sensor result.
///
/// Only the first `num_faces` slots are read. The checksum is returned but
/// not checked here; see [`verify_checksum`].
pub fn decode(raw: &[u8]) -> Result<Frame, DecodeError> {
    if raw.len() < RESULT_BYTE_COUNT {
        return Err(DecodeError::ShortBuffer {
            expected: RESULT_BYTE_COUNT,
            actual: raw.len(),
        });
    }
    if raw.len() > RESULT_BYTE_COUNT {
        return Err(DecodeError::LengthMismatch {
            expected: RESULT_BYTE_COUNT,
            actual: raw.len(),
        });
    }

    let num_faces = raw[NUM_FACES_OFFSET];
    if usize::from(num_faces) > MAX_FACES {
        return Err(DecodeError::TooManyFaces(num_faces));
    }

    let faces = raw[FACES_OFFSET..CHECKSUM_OFFSET]
        .chunks_exact(FACE_BYTE_COUNT)
        .take(usize::from(num_faces))
        .map(FaceRecord::from_slot)
        .collect();

    Ok(Frame {
        pad1: raw[0],
        pad2: raw[1],
        payload_bytes: u16::from_le_bytes([raw[2], raw[3]]),
        faces,
        checksum: u16::from_le_bytes([raw[CHECKSUM_OFFSET], raw[CHECKSUM_OFFSET + 1]]),
    })
}

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, no reflection, no final xor.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Check the trailing checksum of a full-length raw result.
pub fn verify_checksum(raw: &[u8]) -> Result<(), DecodeError> {
    if raw.len() != RESULT_BYTE_COUNT {
        return Err(if raw.len() < RESULT_BYTE_COUNT {
            DecodeError::ShortBuffer {
                expected: RESULT_BYTE_COUNT,
                actual: raw.len(),
            }
        } else {
            DecodeError::LengthMismatch {
                expected: RESULT_BYTE_COUNT,
                actual: raw.len(),
            }
        });
    }

    let expected = crc16(&raw[..CHECKSUM_OFFSET]);
    let actual = u16::from_le_bytes([raw[CHECKSUM_OFFSET], raw[CHECKSUM_OFFSET + 1]]);
    if expected == actual {
        Ok(())
    } else {
        Err(DecodeError::ChecksumMismatch { expected, actual })
    }
}

/// Overwrite the checksum field of `buf` with the CRC of its contents.
pub fn seal(buf: &mut [u8; RESULT_BYTE_COUNT]) {
    let crc = crc16(&buf[..CHECKSUM_OFFSET]);
    buf[CHECKSUM_OFFSET..].copy_from_slice(&crc.to_le_bytes());
}
