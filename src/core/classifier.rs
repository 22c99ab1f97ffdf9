//! Per-frame face classification.
//!
//! The first face large enough to matter is taken as the primary user.
//! Any later large face that is looking at the camera with high confidence
//! is an onlooker ("lookie-loo").

use crate::core::frame::{FaceRecord, Frame};
use serde::{Deserialize, Serialize};

/// Thresholds used to classify faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Width a face must exceed to count, in sensor pixels
    pub main_face_min_width: i16,
    /// Height a face must exceed to count, in sensor pixels
    pub main_face_min_height: i16,
    /// Box confidence an onlooker must exceed
    pub onlooker_min_confidence: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            main_face_min_width: 32,
            main_face_min_height: 32,
            onlooker_min_confidence: 90,
        }
    }
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub has_main_face: bool,
    pub has_lookie_loo: bool,
}

impl FaceRecord {
    /// Whether the face box is strictly larger than the minimum size.
    pub fn is_big_enough(&self, config: &ClassifierConfig) -> bool {
        self.width() > config.main_face_min_width && self.height() > config.main_face_min_height
    }

    /// Whether a big-enough, non-primary face counts as an onlooker.
    fn is_onlooker(&self, config: &ClassifierConfig) -> bool {
        self.is_facing() && self.box_confidence > config.onlooker_min_confidence
    }
}

/// Classify a frame's faces in detection order.
pub fn classify(frame: &Frame, config: &ClassifierConfig) -> Classification {
    classify_faces(&frame.faces, config)
}

/// Classify a sequence of faces in the given order.
pub fn classify_faces(faces: &[FaceRecord], config: &ClassifierConfig) -> Classification {
    let mut result = Classification::default();

    for face in faces.iter().filter(|f| f.is_big_enough(config)) {
        if !result.has_main_face {
            result.has_main_face = true;
        } else if face.is_onlooker(config) {
            result.has_lookie_loo = true;
        }
    }

    result
}
