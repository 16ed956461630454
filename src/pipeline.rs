// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! One-tensor-per-call decode pipeline.
//!
//! [`DecodePipeline`] sequences [`TensorDecoder`] (parse, confidence filter,
//! rescale) and [`SuppressionEngine`] (NMS) for exactly one output tensor per
//! call. Nothing carries over between calls except scratch buffers, which are
//! cleared on entry.

use std::time::Instant;

use crate::config::DecodeConfig;
use crate::decode::TensorDecoder;
use crate::error::Result;
use crate::nms::SuppressionEngine;
use crate::rescale::{FrameSize, FrameTransform};
use crate::results::Detection;
use crate::verbose;

/// Counters and timings for the most recent decode call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecodeStats {
    /// Rows that passed the confidence threshold.
    pub candidates: usize,
    /// Detections left after suppression.
    pub kept: usize,
    /// Time spent decoding, in milliseconds.
    pub decode_ms: f64,
    /// Time spent in NMS, in milliseconds.
    pub nms_ms: f64,
}

impl DecodeStats {
    /// Total time in milliseconds.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.decode_ms + self.nms_ms
    }
}

/// Decode pipeline for a single model variant.
///
/// Methods take `&mut self` for the scratch buffers, so one pipeline serves one
/// worker at a time. It is `Send` and can be moved to a dedicated thread.
///
/// # Example
///
/// ```rust
/// use yolo_decode::{DecodeConfig, DecodePipeline, FrameSize};
///
/// # fn main() -> yolo_decode::Result<()> {
/// let mut pipeline = DecodePipeline::new(DecodeConfig::default())?;
///
/// // One anchor: box at the input center, class 0 scoring 0.9
/// let mut row = vec![0.0_f32; 84];
/// row[..4].copy_from_slice(&[320.0, 320.0, 64.0, 64.0]);
/// row[4] = 0.9;
///
/// let detections = pipeline.run(&row, &[1, 84, 1], FrameSize::new(1280, 1280))?;
/// assert_eq!(detections.len(), 1);
/// assert_eq!(detections[0].label, Some("person"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DecodePipeline {
    config: DecodeConfig,
    decoder: TensorDecoder,
    engine: SuppressionEngine,
    candidates: Vec<Detection>,
    #[cfg(feature = "f16")]
    scratch: Vec<f32>,
    stats: DecodeStats,
}

impl DecodePipeline {
    /// Build a pipeline from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DecodeError::ConfigError`] if the configuration is invalid.
    pub fn new(config: DecodeConfig) -> Result<Self> {
        config.validate()?;

        let decoder = TensorDecoder::from_config(&config);
        let engine = SuppressionEngine::new(config.iou_threshold, config.class_scope)
            .with_max_detections(config.max_detections);

        Ok(Self {
            config,
            decoder,
            engine,
            candidates: Vec::new(),
            #[cfg(feature = "f16")]
            scratch: Vec::new(),
            stats: DecodeStats::default(),
        })
    }

    /// The configuration this pipeline was built with.
    #[must_use]
    pub const fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Statistics of the last successful call.
    #[must_use]
    pub const fn last_stats(&self) -> DecodeStats {
        self.stats
    }

    /// Decode one flat `f32` output tensor for a frame of size `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DecodeError::ShapeError`] if `shape` or `output` does
    /// not match the configured variant and layout, and
    /// [`crate::DecodeError::ConfigError`] for a zero-sized frame.
    pub fn run(&mut self, output: &[f32], shape: &[usize], frame: FrameSize) -> Result<Vec<Detection>> {
        let transform = self.transform(frame)?;
        let start = Instant::now();

        self.candidates.clear();
        self.decoder
            .decode_tensor(output, shape, &transform, &mut self.candidates)?;

        Ok(self.suppress(start))
    }

    /// Decode one half-precision output tensor.
    ///
    /// Values are widened into a scratch buffer reused across calls.
    ///
    /// # Errors
    ///
    /// Same as [`DecodePipeline::run`].
    #[cfg(feature = "f16")]
    pub fn run_f16(
        &mut self,
        output: &[half::f16],
        shape: &[usize],
        frame: FrameSize,
    ) -> Result<Vec<Detection>> {
        let transform = self.transform(frame)?;
        let start = Instant::now();

        self.scratch.clear();
        self.scratch.extend(output.iter().map(|v| v.to_f32()));

        self.candidates.clear();
        self.decoder
            .decode_tensor(&self.scratch, shape, &transform, &mut self.candidates)?;

        Ok(self.suppress(start))
    }

    /// Decode pre-split anchor rows (e.g. from a channels-last engine binding).
    ///
    /// # Errors
    ///
    /// Returns [`crate::DecodeError::ShapeError`] if any row length does not
    /// match the variant's channel count.
    pub fn run_rows<'r, I>(&mut self, rows: I, frame: FrameSize) -> Result<Vec<Detection>>
    where
        I: IntoIterator<Item = &'r [f32]>,
    {
        let transform = self.transform(frame)?;
        let start = Instant::now();

        self.candidates.clear();
        if let Err(err) = self
            .decoder
            .decode_rows(rows, &transform, &mut self.candidates)
        {
            self.candidates.clear();
            return Err(err);
        }

        Ok(self.suppress(start))
    }

    fn transform(&self, frame: FrameSize) -> Result<FrameTransform> {
        FrameTransform::new(self.config.resize_mode, self.config.imgsz, frame)
    }

    /// Run NMS over the collected candidates and hand them out.
    fn suppress(&mut self, start: Instant) -> Vec<Detection> {
        let decode_ms = start.elapsed().as_secs_f64() * 1000.0;
        let candidates = self.candidates.len();

        let start_nms = Instant::now();
        self.engine.suppress(&mut self.candidates);
        let nms_ms = start_nms.elapsed().as_secs_f64() * 1000.0;

        self.stats = DecodeStats {
            candidates,
            kept: self.candidates.len(),
            decode_ms,
            nms_ms,
        };
        verbose!(
            "{}: {} candidates, {} kept after {} NMS (iou {:.2}) in {:.2}ms decode, {:.2}ms nms",
            self.config.variant,
            self.stats.candidates,
            self.stats.kept,
            self.engine.scope(),
            self.engine.iou_threshold(),
            decode_ms,
            nms_ms
        );

        self.candidates.drain(..).collect()
    }
}

/// Decode a single tensor with a throwaway pipeline.
///
/// Prefer a long-lived [`DecodePipeline`] in a frame loop.
///
/// # Errors
///
/// See [`DecodePipeline::new`] and [`DecodePipeline::run`].
pub fn decode(
    output: &[f32],
    shape: &[usize],
    frame: FrameSize,
    config: &DecodeConfig,
) -> Result<Vec<Detection>> {
    DecodePipeline::new(config.clone())?.run(output, shape, frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::nms::ClassScope;
    use crate::variant::ModelVariant;

    fn detect_rows(rows: &[([f32; 4], usize, f32)]) -> Vec<Vec<f32>> {
        rows.iter()
            .map(|&(xywh, class_id, score)| {
                let mut row = vec![0.0; 84];
                row[..4].copy_from_slice(&xywh);
                row[4 + class_id] = score;
                row
            })
            .collect()
    }

    #[test]
    fn test_pipeline_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DecodePipeline>();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = DecodePipeline::new(DecodeConfig::new().with_iou(1.5)).unwrap_err();
        assert!(matches!(err, DecodeError::ConfigError(_)));
    }

    #[test]
    fn test_run_rows_suppresses() {
        let rows = detect_rows(&[
            ([50.0, 50.0, 20.0, 20.0], 0, 0.9),
            ([51.0, 51.0, 20.0, 20.0], 0, 0.8),
            ([51.0, 51.0, 20.0, 20.0], 3, 0.7),
            ([10.0, 10.0, 4.0, 4.0], 2, 0.1),
        ]);
        let config = DecodeConfig::new()
            .with_imgsz(100, 100)
            .with_class_scope(ClassScope::PerClass);
        let mut pipeline = DecodePipeline::new(config).unwrap();

        let dets = pipeline
            .run_rows(rows.iter().map(Vec::as_slice), FrameSize::new(200, 200))
            .unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].bbox.xyxy(), [80.0, 80.0, 120.0, 120.0]);
        assert_eq!(dets[1].class_id, 3);

        let stats = pipeline.last_stats();
        assert_eq!((stats.candidates, stats.kept), (3, 2));
    }

    #[test]
    fn test_error_does_not_leak_into_next_call() {
        let mut pipeline = DecodePipeline::new(DecodeConfig::new().with_imgsz(100, 100)).unwrap();
        let mut rows = detect_rows(&[([50.0, 50.0, 20.0, 20.0], 0, 0.9)]);
        rows.push(vec![0.0; 56]);

        assert!(
            pipeline
                .run_rows(rows.iter().map(Vec::as_slice), FrameSize::new(100, 100))
                .is_err()
        );

        let dets = pipeline.run_rows(std::iter::empty(), FrameSize::new(100, 100)).unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn test_zero_frame_rejected() {
        let mut pipeline = DecodePipeline::new(DecodeConfig::default()).unwrap();
        let err = pipeline.run(&[], &[1, 84, 0], FrameSize::new(0, 480)).unwrap_err();
        assert!(matches!(err, DecodeError::ConfigError(_)));
    }

    #[test]
    fn test_max_detections() {
        let rows: Vec<_> = (0..10u8)
            .map(|i| {
                let c = f32::from(i) * 60.0 + 10.0;
                ([c, c, 10.0, 10.0], 0, 0.5 + f32::from(i) / 100.0)
            })
            .collect();
        let rows = detect_rows(&rows);
        let mut pipeline =
            DecodePipeline::new(DecodeConfig::new().with_max_detections(4)).unwrap();
        let dets = pipeline
            .run_rows(rows.iter().map(Vec::as_slice), FrameSize::new(640, 640))
            .unwrap();
        assert_eq!(dets.len(), 4);
        assert!((dets[0].score - 0.59).abs() < 1e-6);
    }

    #[cfg(feature = "f16")]
    #[test]
    fn test_run_f16_matches_f32() {
        let config = DecodeConfig::new()
            .with_variant(ModelVariant::Pose)
            .with_imgsz(64, 64);
        let mut row = vec![0.25_f32; 56];
        row[..5].copy_from_slice(&[32.0, 32.0, 16.0, 16.0, 0.75]);

        let mut pipeline = DecodePipeline::new(config).unwrap();
        let frame = FrameSize::new(128, 128);
        let expected = pipeline.run(&row, &[56, 1], frame).unwrap();

        let half_row: Vec<half::f16> = row.iter().copied().map(half::f16::from_f32).collect();
        let got = pipeline.run_f16(&half_row, &[56, 1], frame).unwrap();

        assert_eq!(got, expected);
        assert_eq!(got[0].bbox.xyxy(), [48.0, 48.0, 80.0, 80.0]);
    }

    #[test]
    fn test_decode_convenience() {
        let config = DecodeConfig::new().with_variant(ModelVariant::Pose);
        let dets = decode(&[], &[1, 56, 0], FrameSize::new(640, 480), &config).unwrap();
        assert!(dets.is_empty());
    }
}
