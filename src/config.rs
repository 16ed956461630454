// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Decode configuration.
//!
//! This module defines the [`DecodeConfig`] struct, which bundles every knob of
//! the decode pipeline (model variant, thresholds, input size, suppression
//! policy, resize mode and tensor layout) into one immutable value passed
//! explicitly at construction.

use crate::decode::TensorLayout;
use crate::error::{DecodeError, Result};
use crate::nms::ClassScope;
use crate::rescale::ResizeMode;
use crate::variant::ModelVariant;

/// Configuration for the YOLO decode pipeline.
///
/// It uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use yolo_decode::{ClassScope, DecodeConfig, ModelVariant};
///
/// let config = DecodeConfig::new()
///     .with_variant(ModelVariant::Pose)
///     .with_confidence(0.5)
///     .with_iou(0.45)
///     .with_class_scope(ClassScope::PerClass)
///     .with_imgsz(320, 320);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeConfig {
    /// Output layout the model was exported with.
    pub variant: ModelVariant,
    /// Confidence threshold (0.0 to 1.0).
    /// Rows scoring below this value are discarded; a score equal to it is kept.
    pub confidence_threshold: f32,
    /// `IoU` threshold for Non-Maximum Suppression (0.0 to 1.0).
    /// A candidate overlapping an accepted box by at least this much is dropped.
    pub iou_threshold: f32,
    /// Maximum number of detections to return per tensor.
    pub max_detections: usize,
    /// Model input size (height, width) the tensor coordinates refer to.
    pub imgsz: (usize, usize),
    /// Whether suppression compares across classes.
    pub class_scope: ClassScope,
    /// How frames were resized to the model input.
    pub resize_mode: ResizeMode,
    /// Axis order of the raw output tensor.
    pub layout: TensorLayout,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            variant: ModelVariant::Detect,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
            imgsz: (640, 640),
            class_scope: ClassScope::Agnostic,
            resize_mode: ResizeMode::Stretch,
            layout: TensorLayout::ChannelsFirst,
        }
    }
}

impl DecodeConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model variant.
    #[must_use]
    pub const fn with_variant(mut self, variant: ModelVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the confidence threshold.
    ///
    /// # Arguments
    ///
    /// * `threshold` - The minimum confidence score (0.0 to 1.0), inclusive.
    #[must_use]
    pub const fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the `IoU` threshold for Non-Maximum Suppression (NMS).
    ///
    /// # Arguments
    ///
    /// * `threshold` - The `IoU` threshold (0.0 to 1.0).
    #[must_use]
    pub const fn with_iou(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Set the maximum number of detections to return.
    #[must_use]
    pub const fn with_max_detections(mut self, max: usize) -> Self {
        self.max_detections = max;
        self
    }

    /// Set the model input size the tensor coordinates refer to.
    ///
    /// # Arguments
    ///
    /// * `height` - Input height.
    /// * `width` - Input width.
    #[must_use]
    pub const fn with_imgsz(mut self, height: usize, width: usize) -> Self {
        self.imgsz = (height, width);
        self
    }

    /// Set the suppression class scope.
    #[must_use]
    pub const fn with_class_scope(mut self, scope: ClassScope) -> Self {
        self.class_scope = scope;
        self
    }

    /// Set the resize mode used to produce the model input.
    #[must_use]
    pub const fn with_resize_mode(mut self, mode: ResizeMode) -> Self {
        self.resize_mode = mode;
        self
    }

    /// Set the raw tensor layout.
    #[must_use]
    pub const fn with_layout(mut self, layout: TensorLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ConfigError`] if a threshold is outside `[0, 1]`
    /// (or `NaN`), the input size has a zero extent, or `max_detections` is 0.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(DecodeError::ConfigError(format!(
                "confidence threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(DecodeError::ConfigError(format!(
                "IoU threshold must be in [0, 1], got {}",
                self.iou_threshold
            )));
        }
        if self.imgsz.0 == 0 || self.imgsz.1 == 0 {
            return Err(DecodeError::ConfigError(format!(
                "input size must be positive, got {}x{}",
                self.imgsz.1, self.imgsz.0
            )));
        }
        if self.max_detections == 0 {
            return Err(DecodeError::ConfigError(
                "max detections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
