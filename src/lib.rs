// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # YOLO Output Decoding Library
//!
//! Post-inference decoding for [Ultralytics](https://ultralytics.com) YOLO models:
//! turns the raw per-anchor output tensor of a detect or pose model into a
//! deduplicated, score-ordered list of detections in original-frame pixels.
//!
//! The library neither runs inference nor touches pixels. Feed it the tensor
//! your inference engine produced and the size of the frame it came from.
//!
//! ## Features
//!
//! - **Detect and Pose** - 84-channel (80 COCO classes) and 56-channel (17 keypoints) outputs
//! - **Zero-copy** - channels-first tensors are read through a strided view
//! - **Greedy NMS** - class-agnostic or per-class, with a detection cap
//! - **Stretch or Letterbox** - coordinates mapped back for either resize strategy
//! - **FP16** - half-precision outputs accepted directly (`f16` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use yolo_decode::{DecodeConfig, DecodePipeline, FrameSize, ModelVariant};
//!
//! # fn main() -> yolo_decode::Result<()> {
//! let config = DecodeConfig::new()
//!     .with_variant(ModelVariant::Detect)
//!     .with_confidence(0.25)
//!     .with_iou(0.45)
//!     .with_imgsz(640, 640);
//! let mut pipeline = DecodePipeline::new(config)?;
//!
//! // Tensor of shape [1, 84, N] straight from the inference engine
//! let output = vec![0.0_f32; 84 * 8400];
//! let detections = pipeline.run(&output, &[1, 84, 8400], FrameSize::new(1280, 720))?;
//!
//! for det in &detections {
//!     println!("{} {:.2} {:?}", det.name(), det.score, det.bbox.xyxy());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Decode a JSON tensor dump ({"shape": [...], "data": [...]})
//! yolo-decode decode --tensor output.json --frame 1280x720
//!
//! # Raw little-endian f32 dump of a pose model, printed as JSON
//! yolo-decode decode -t output.bin --shape 1,56,8400 --variant pose --frame 640x480 --json
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pipeline`] | [`DecodePipeline`]: decode then suppress, one tensor per call |
//! | [`decode`] | [`TensorDecoder`]: anchor rows to candidates |
//! | [`nms`] | [`SuppressionEngine`]: greedy Non-Maximum Suppression |
//! | [`geometry`] | [`BoundingBox`] and `IoU` primitives |
//! | [`rescale`] | [`FrameTransform`]: input space to frame pixels |
//! | [`config`] | [`DecodeConfig`] builder |
//! | [`variant`] | [`ModelVariant`]: Detect or Pose |
//! | [`results`] | [`Detection`], [`Keypoint`], [`DetectionRecord`] |
//! | [`coco`] | COCO class and keypoint names |
//! | [`skeleton`] | Pose skeleton connectivity |
//! | [`io`] | Tensor file loading |
//! | [`error`] | Error types ([`DecodeError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `f16` | Half-precision tensor input via [`DecodePipeline::run_f16`] (default) |
//!
//! ## License
//!
//! This project is licensed under [AGPL-3.0](https://ultralytics.com/license).

// Modules
pub mod cli;
pub mod coco;
pub mod config;
pub mod decode;
pub mod error;
pub mod geometry;
pub mod io;
pub mod nms;
pub mod pipeline;
pub mod rescale;
pub mod results;
pub mod skeleton;
pub mod utils;
pub mod variant;

// Re-export main types for convenience
pub use config::DecodeConfig;
pub use decode::{TensorDecoder, TensorLayout};
pub use error::{DecodeError, Result};
pub use geometry::BoundingBox;
pub use nms::{ClassScope, SuppressionEngine, non_max_suppression};
pub use pipeline::{DecodePipeline, DecodeStats, decode};
pub use rescale::{FrameSize, FrameTransform, ResizeMode};
pub use results::{Detection, DetectionRecord, Keypoint, KeypointRecord};
pub use variant::ModelVariant;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "yolo-decode");
    }
}
