// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Detection records produced by the decode pipeline.
//!
//! [`Detection`] is the in-memory form with sub-pixel `f32` coordinates.
//! [`DetectionRecord`] is the serializable form handed to renderers, with
//! coordinates rounded to integer pixels.

use serde::Serialize;

use crate::coco::{self, NUM_KEYPOINTS};
pub use crate::geometry::BoundingBox;

/// A single body joint in original-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Keypoint {
    /// X coordinate in pixels.
    pub x: f32,
    /// Y coordinate in pixels.
    pub y: f32,
    /// Keypoint confidence, passed through from the model unchanged.
    pub conf: f32,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(x: f32, y: f32, conf: f32) -> Self {
        Self { x, y, conf }
    }
}

/// A decoded detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Box in original-frame pixels.
    pub bbox: BoundingBox,
    /// Confidence score (class score for detect, objectness for pose).
    pub score: f32,
    /// Class index (always 0 for pose).
    pub class_id: usize,
    /// Class name, detect variant only.
    pub label: Option<&'static str>,
    /// Exactly 17 COCO-ordered keypoints, pose variant only.
    pub keypoints: Option<[Keypoint; NUM_KEYPOINTS]>,
}

impl Detection {
    /// Create a detection without label or keypoints.
    #[must_use]
    pub const fn new(bbox: BoundingBox, score: f32, class_id: usize) -> Self {
        Self {
            bbox,
            score,
            class_id,
            label: None,
            keypoints: None,
        }
    }

    /// Attach a class label.
    #[must_use]
    pub const fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Attach keypoints.
    #[must_use]
    pub const fn with_keypoints(mut self, keypoints: [Keypoint; NUM_KEYPOINTS]) -> Self {
        self.keypoints = Some(keypoints);
        self
    }

    /// Display name: the label if present, otherwise the COCO name of `class_id`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.label
            .or_else(|| coco::class_name(self.class_id))
            .unwrap_or("object")
    }

    /// Convert to the serializable integer-pixel form.
    #[must_use]
    pub fn to_record(&self) -> DetectionRecord {
        DetectionRecord::from(self)
    }
}

/// Keypoint in integer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeypointRecord {
    /// X coordinate in pixels.
    pub x: i32,
    /// Y coordinate in pixels.
    pub y: i32,
    /// Keypoint confidence (0.0 - 1.0).
    pub conf: f32,
}

/// Serializable detection record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRecord {
    /// Bounding box `[x1, y1, x2, y2]` in pixels.
    #[serde(rename = "box")]
    pub bbox: [i32; 4],
    /// Detection confidence (0.0 - 1.0).
    pub score: f32,
    /// Class ID (0-79 for COCO).
    pub class_id: usize,
    /// Human-readable class name (detect variant only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    /// 17 body keypoints (pose variant only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<Vec<KeypointRecord>>,
}

#[allow(clippy::cast_possible_truncation)]
fn to_pixel(v: f32) -> i32 {
    v.round() as i32
}

impl From<&Keypoint> for KeypointRecord {
    fn from(kpt: &Keypoint) -> Self {
        Self {
            x: to_pixel(kpt.x),
            y: to_pixel(kpt.y),
            conf: kpt.conf,
        }
    }
}

impl From<&Detection> for DetectionRecord {
    fn from(det: &Detection) -> Self {
        let b = det.bbox;
        Self {
            bbox: [to_pixel(b.x1), to_pixel(b.y1), to_pixel(b.x2), to_pixel(b.y2)],
            score: det.score,
            class_id: det.class_id,
            label: det.label,
            keypoints: det
                .keypoints
                .as_ref()
                .map(|kpts| kpts.iter().map(KeypointRecord::from).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rounds_to_pixels() {
        let det = Detection::new(BoundingBox::new(10.4, 20.6, 99.5, 200.49), 0.95, 5)
            .with_label("bus");
        let rec = det.to_record();

        assert_eq!(rec.bbox, [10, 21, 100, 200]);
        assert_eq!(rec.class_id, 5);
        assert_eq!(rec.label, Some("bus"));
        assert!(rec.keypoints.is_none());
    }

    #[test]
    fn test_record_keypoints() {
        let kpts = [Keypoint::new(1.6, 2.2, 0.75); NUM_KEYPOINTS];
        let det = Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9, 0)
            .with_keypoints(kpts);
        let rec = det.to_record();

        let rk = rec.keypoints.unwrap();
        assert_eq!(rk.len(), NUM_KEYPOINTS);
        assert_eq!((rk[0].x, rk[0].y), (2, 2));
        assert!((rk[0].conf - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_record_json_shape() {
        let det = Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.5, 0)
            .with_label("person");
        let json = serde_json::to_value(det.to_record()).unwrap();

        assert_eq!(json["box"], serde_json::json!([0, 0, 10, 10]));
        assert_eq!(json["label"], "person");
        assert!(json.get("keypoints").is_none());
    }

    #[test]
    fn test_detection_name_fallback() {
        let det = Detection::new(BoundingBox::default(), 0.9, 0);
        assert_eq!(det.name(), "person");

        let det = Detection::new(BoundingBox::default(), 0.9, 500);
        assert_eq!(det.name(), "object");
    }
}
