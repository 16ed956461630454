// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Greedy Non-Maximum Suppression (NMS).
//!
//! Candidates are stable-sorted by descending score (ties keep input order).
//! The best remaining candidate is accepted and every remaining candidate whose
//! `IoU` with it is at least `iou_threshold` is discarded, until none remain.
//!
//! Whether candidates of different classes may suppress each other is an
//! explicit [`ClassScope`] parameter.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;
use crate::geometry::iou;
use crate::results::Detection;

/// Which candidate pairs are compared during suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassScope {
    /// Compare every pair regardless of class.
    #[default]
    Agnostic,
    /// Only compare candidates sharing a `class_id`.
    PerClass,
}

impl ClassScope {
    /// Returns whether candidates of class `a` and `b` may suppress each other.
    #[inline]
    #[must_use]
    pub const fn compares(&self, a: usize, b: usize) -> bool {
        match self {
            Self::Agnostic => true,
            Self::PerClass => a == b,
        }
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Agnostic => "agnostic",
            Self::PerClass => "per-class",
        }
    }
}

impl fmt::Display for ClassScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClassScope {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "agnostic" | "all" => Ok(Self::Agnostic),
            "per-class" | "per_class" | "class" | "aware" => Ok(Self::PerClass),
            _ => Err(DecodeError::ConfigError(format!(
                "invalid class scope '{s}', expected one of: agnostic, per-class"
            ))),
        }
    }
}

/// Descending score order with `NaN` ranked last.
#[inline]
fn by_score_desc(a: f32, b: f32) -> Ordering {
    let rank = |s: f32| if s.is_nan() { f32::NEG_INFINITY } else { s };
    rank(b).total_cmp(&rank(a))
}

/// Reusable NMS state.
///
/// Holds the sort order and suppression flags between calls so a long-running
/// frame loop does not reallocate them for every tensor.
#[derive(Debug, Clone)]
pub struct SuppressionEngine {
    iou_threshold: f32,
    scope: ClassScope,
    max_detections: usize,
    order: Vec<usize>,
    suppressed: Vec<bool>,
    keep: Vec<usize>,
}

impl SuppressionEngine {
    /// Create an engine with no detection cap.
    #[must_use]
    pub const fn new(iou_threshold: f32, scope: ClassScope) -> Self {
        Self {
            iou_threshold,
            scope,
            max_detections: usize::MAX,
            order: Vec::new(),
            suppressed: Vec::new(),
            keep: Vec::new(),
        }
    }

    /// Keep at most `max` survivors (highest scores first). A cap of 0 keeps none.
    #[must_use]
    pub const fn with_max_detections(mut self, max: usize) -> Self {
        self.max_detections = max;
        self
    }

    /// `IoU` threshold at or above which a candidate is suppressed.
    #[must_use]
    pub const fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Class scoping policy.
    #[must_use]
    pub const fn scope(&self) -> ClassScope {
        self.scope
    }

    /// Run NMS and return indices of survivors in descending score order.
    pub fn keep_indices(&mut self, detections: &[Detection]) -> &[usize] {
        let n = detections.len();

        self.order.clear();
        self.order.extend(0..n);
        // `sort_by` is stable: equal scores keep input order
        self.order
            .sort_by(|&a, &b| by_score_desc(detections[a].score, detections[b].score));

        self.suppressed.clear();
        self.suppressed.resize(n, false);
        self.keep.clear();

        for (pos, &i) in self.order.iter().enumerate() {
            if self.keep.len() >= self.max_detections {
                break;
            }
            if self.suppressed[i] {
                continue;
            }
            self.keep.push(i);

            let best = &detections[i];
            for &j in &self.order[pos + 1..] {
                if self.suppressed[j] || !self.scope.compares(best.class_id, detections[j].class_id)
                {
                    continue;
                }
                if iou(&best.bbox, &detections[j].bbox) >= self.iou_threshold {
                    self.suppressed[j] = true;
                }
            }
        }

        &self.keep
    }

    /// Run NMS in place: `detections` is reduced to the survivors, sorted by
    /// descending score.
    pub fn suppress(&mut self, detections: &mut Vec<Detection>) {
        let n = detections.len();
        self.keep_indices(detections);

        // Reuse the flag buffer as a "drop" mask
        self.suppressed.clear();
        self.suppressed.resize(n, true);
        for &i in &self.keep {
            self.suppressed[i] = false;
        }

        let mut idx = 0;
        detections.retain(|_| {
            let keep = !self.suppressed[idx];
            idx += 1;
            keep
        });

        // Same stable ordering as `keep_indices`, so this reproduces it exactly
        detections.sort_by(|a, b| by_score_desc(a.score, b.score));
    }
}

/// Non-Maximum Suppression for a one-off candidate list.
///
/// # Arguments
///
/// * `detections` - Candidate detections, in any order.
/// * `iou_threshold` - `IoU` at or above which the lower-scored box is dropped.
/// * `scope` - Whether different classes suppress each other.
///
/// # Returns
///
/// Survivors sorted by descending score.
#[must_use]
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    scope: ClassScope,
) -> Vec<Detection> {
    SuppressionEngine::new(iou_threshold, scope).suppress(&mut detections);
    detections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn det(xyxy: [f32; 4], score: f32, class_id: usize) -> Detection {
        Detection::new(BoundingBox::from(xyxy), score, class_id)
    }

    #[test]
    fn test_nms() {
        let boxes = vec![
            det([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            det([1.0, 1.0, 11.0, 11.0], 0.8, 0),
            det([100.0, 100.0, 110.0, 110.0], 0.95, 0),
        ];
        let kept = non_max_suppression(boxes, 0.5, ClassScope::Agnostic);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].score - 0.95).abs() < 1e-6);
        assert!((kept[1].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_nested_box_suppressed() {
        let boxes = vec![
            det([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            det([1.0, 1.0, 10.0, 10.0], 0.8, 0),
        ];
        let kept = non_max_suppression(boxes, 0.45, ClassScope::Agnostic);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bbox.xyxy(), [0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_disjoint_boxes_survive_in_both_scopes() {
        for scope in [ClassScope::Agnostic, ClassScope::PerClass] {
            let boxes = vec![
                det([0.0, 0.0, 10.0, 10.0], 0.9, 0),
                det([100.0, 100.0, 110.0, 110.0], 0.8, 1),
            ];
            assert_eq!(non_max_suppression(boxes, 0.45, scope).len(), 2);
        }
    }

    #[test]
    fn test_class_scope_changes_output() {
        let boxes = vec![
            det([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            det([1.0, 1.0, 11.0, 11.0], 0.8, 1),
        ];
        assert_eq!(
            non_max_suppression(boxes.clone(), 0.5, ClassScope::Agnostic).len(),
            1
        );
        assert_eq!(non_max_suppression(boxes, 0.5, ClassScope::PerClass).len(), 2);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // IoU of identical boxes is exactly 1.0
        let boxes = vec![
            det([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            det([0.0, 0.0, 10.0, 10.0], 0.8, 0),
        ];
        assert_eq!(non_max_suppression(boxes, 1.0, ClassScope::Agnostic).len(), 1);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let boxes = vec![
            det([0.0, 0.0, 10.0, 10.0], 0.7, 3),
            det([1.0, 1.0, 11.0, 11.0], 0.7, 4),
        ];
        let kept = non_max_suppression(boxes, 0.5, ClassScope::Agnostic);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].class_id, 3);
    }

    #[test]
    fn test_max_detections_cap() {
        let boxes: Vec<_> = (0..10u8)
            .map(|i| {
                let o = f32::from(i) * 100.0;
                det([o, o, o + 10.0, o + 10.0], f32::from(i) / 10.0, 0)
            })
            .collect();
        let mut engine = SuppressionEngine::new(0.45, ClassScope::Agnostic).with_max_detections(3);
        let keep = engine.keep_indices(&boxes).to_vec();
        assert_eq!(keep, vec![9, 8, 7]);

        let mut engine = SuppressionEngine::new(0.45, ClassScope::Agnostic).with_max_detections(0);
        assert!(engine.keep_indices(&boxes).is_empty());
        let mut all = boxes;
        engine.suppress(&mut all);
        assert!(all.is_empty());
    }

    #[test]
    fn test_class_scope_from_str() {
        assert_eq!("per-class".parse::<ClassScope>().unwrap(), ClassScope::PerClass);
        assert_eq!("AGNOSTIC".parse::<ClassScope>().unwrap(), ClassScope::Agnostic);
        assert_eq!(ClassScope::PerClass.to_string().parse::<ClassScope>().unwrap(), ClassScope::PerClass);
        assert!("nearest".parse::<ClassScope>().is_err());
    }

    #[test]
    fn test_nan_scores_rank_last() {
        let boxes = vec![
            det([0.0, 0.0, 10.0, 10.0], f32::NAN, 0),
            det([0.0, 0.0, 10.0, 10.0], 0.6, 0),
        ];
        let kept = non_max_suppression(boxes, 0.5, ClassScope::Agnostic);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_engine_reuse_and_idempotence() {
        let mut engine = SuppressionEngine::new(0.45, ClassScope::PerClass);
        let mut boxes = vec![
            det([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            det([2.0, 2.0, 12.0, 12.0], 0.85, 0),
            det([2.0, 2.0, 12.0, 12.0], 0.8, 1),
            det([50.0, 50.0, 60.0, 60.0], 0.3, 0),
        ];
        engine.suppress(&mut boxes);
        let first = boxes.clone();
        engine.suppress(&mut boxes);
        assert_eq!(first, boxes);
        assert!(engine.keep_indices(&[]).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(non_max_suppression(Vec::new(), 0.45, ClassScope::Agnostic).is_empty());
    }
}
