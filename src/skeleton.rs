// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! COCO-Pose skeleton connectivity.

use crate::coco::NUM_KEYPOINTS;
use crate::results::Keypoint;

/// Pairs of keypoint indices forming the pose skeleton.
/// Indices follow [`crate::coco::KEYPOINT_NAMES`].
pub const SKELETON: [[usize; 2]; 16] = [
    [5, 7],   // left shoulder to left elbow
    [7, 9],   // left elbow to left wrist
    [6, 8],   // right shoulder to right elbow
    [8, 10],  // right elbow to right wrist
    [5, 6],   // left shoulder to right shoulder
    [5, 11],  // left shoulder to left hip
    [6, 12],  // right shoulder to right hip
    [11, 12], // left hip to right hip
    [11, 13], // left hip to left knee
    [13, 15], // left knee to left ankle
    [12, 14], // right hip to right knee
    [14, 16], // right knee to right ankle
    [0, 1],   // nose to left eye
    [0, 2],   // nose to right eye
    [1, 3],   // left eye to left ear
    [2, 4],   // right eye to right ear
];

/// Body region of a limb, for renderers that color by region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimbGroup {
    /// Shoulder to wrist.
    Arm,
    /// Shoulders and hips.
    Torso,
    /// Hip to ankle.
    Leg,
    /// Nose, eyes and ears.
    Face,
}

/// Region of each entry in [`SKELETON`].
pub const LIMB_GROUPS: [LimbGroup; 16] = [
    LimbGroup::Arm,
    LimbGroup::Arm,
    LimbGroup::Arm,
    LimbGroup::Arm,
    LimbGroup::Torso,
    LimbGroup::Torso,
    LimbGroup::Torso,
    LimbGroup::Torso,
    LimbGroup::Leg,
    LimbGroup::Leg,
    LimbGroup::Leg,
    LimbGroup::Leg,
    LimbGroup::Face,
    LimbGroup::Face,
    LimbGroup::Face,
    LimbGroup::Face,
];

/// Iterate over skeleton segments whose endpoints both exceed `min_conf`.
pub fn visible_limbs(
    keypoints: &[Keypoint; NUM_KEYPOINTS],
    min_conf: f32,
) -> impl Iterator<Item = (LimbGroup, Keypoint, Keypoint)> + '_ {
    SKELETON
        .iter()
        .zip(LIMB_GROUPS)
        .filter_map(move |(&[a, b], group)| {
            let (ka, kb) = (keypoints[a], keypoints[b]);
            (ka.conf > min_conf && kb.conf > min_conf).then_some((group, ka, kb))
        })
}
