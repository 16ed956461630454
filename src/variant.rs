// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Model variant definitions.
//!
//! A [`ModelVariant`] fixes the channel layout of the raw output tensor and the
//! decode strategy applied to every anchor row. It is chosen once at
//! configuration time and never compared per row.

use std::fmt;
use std::str::FromStr;

use crate::coco::{NUM_CLASSES, NUM_KEYPOINTS};
use crate::error::DecodeError;

/// Number of box channels (`xc`, `yc`, `w`, `h`) leading every anchor row.
pub const BOX_CHANNELS: usize = 4;

/// Values stored per keypoint (`x`, `y`, `conf`).
pub const KEYPOINT_DIM: usize = 3;

/// YOLO output variants understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelVariant {
    /// Object detection: 4 box channels followed by 80 class scores.
    #[default]
    Detect,
    /// Pose estimation: 4 box channels, 1 objectness score, 17 keypoints x 3.
    Pose,
}

impl ModelVariant {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Pose => "pose",
        }
    }

    /// Number of channels per anchor row (84 for detect, 56 for pose).
    #[must_use]
    pub const fn channels(&self) -> usize {
        match self {
            Self::Detect => BOX_CHANNELS + NUM_CLASSES,
            Self::Pose => BOX_CHANNELS + 1 + NUM_KEYPOINTS * KEYPOINT_DIM,
        }
    }

    /// Number of score channels following the box.
    #[must_use]
    pub const fn num_classes(&self) -> usize {
        match self {
            Self::Detect => NUM_CLASSES,
            Self::Pose => 1,
        }
    }

    /// Returns whether detections carry keypoints.
    #[must_use]
    pub const fn has_keypoints(&self) -> bool {
        matches!(self, Self::Pose)
    }

    /// Returns whether detections carry a class label.
    #[must_use]
    pub const fn has_labels(&self) -> bool {
        matches!(self, Self::Detect)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "detect" | "detection" | "object" => Ok(Self::Detect),
            "pose" | "keypoint" | "keypoints" => Ok(Self::Pose),
            _ => Err(DecodeError::ConfigError(format!(
                "invalid model variant '{s}', expected one of: detect, pose"
            ))),
        }
    }
}
