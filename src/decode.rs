// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Raw output tensor decoding.
//!
//! YOLO exports emit one tensor of shape `[1, C, N]`: `N` anchor rows of `C`
//! channels each, stored channels-first. The channel layout depends on the
//! [`ModelVariant`]:
//!
//! - detect: `C = 84` = 4 (`xc, yc, w, h`) + 80 class scores
//! - pose: `C = 56` = 4 (`xc, yc, w, h`) + 1 objectness + 17 keypoints x (`x, y, conf`)
//!
//! The decoder filters rows by confidence and maps boxes and keypoints into
//! original-frame pixels with a [`FrameTransform`]. It does not suppress
//! overlaps; see [`crate::nms`].

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayView1, ArrayView2};

use crate::coco::{self, NUM_KEYPOINTS};
use crate::config::DecodeConfig;
use crate::error::{DecodeError, Result};
use crate::rescale::FrameTransform;
use crate::results::{Detection, Keypoint};
use crate::variant::{BOX_CHANNELS, KEYPOINT_DIM, ModelVariant};

/// Channel index of the pose objectness score.
const POSE_SCORE_CHANNEL: usize = BOX_CHANNELS;

/// Channel index of the first pose keypoint.
const POSE_KEYPOINT_CHANNEL: usize = BOX_CHANNELS + 1;

/// Axis order of the raw output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[1, C, N]`: channel-major, as exported by Ultralytics.
    #[default]
    ChannelsFirst,
    /// `[1, N, C]`: one contiguous row per anchor.
    ChannelsLast,
}

impl TensorLayout {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelsFirst => "channels-first",
            Self::ChannelsLast => "channels-last",
        }
    }
}

impl fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TensorLayout {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "channels-first" | "channels_first" | "cn" | "nchw" => Ok(Self::ChannelsFirst),
            "channels-last" | "channels_last" | "nc" | "transposed" => Ok(Self::ChannelsLast),
            _ => Err(DecodeError::ConfigError(format!(
                "invalid tensor layout '{s}', expected one of: channels-first, channels-last"
            ))),
        }
    }
}

/// Per-row decode strategy, selected from the variant at construction.
type RowDecoder = fn(ArrayView1<'_, f32>, f32, &FrameTransform) -> Option<Detection>;

/// Parses anchor rows into candidate detections.
///
/// The decoder is a pure function of its inputs: it holds only the immutable
/// variant, layout and confidence threshold.
#[derive(Debug, Clone, Copy)]
pub struct TensorDecoder {
    variant: ModelVariant,
    layout: TensorLayout,
    confidence_threshold: f32,
    decode_row: RowDecoder,
}

impl TensorDecoder {
    /// Create a decoder.
    #[must_use]
    pub fn new(variant: ModelVariant, layout: TensorLayout, confidence_threshold: f32) -> Self {
        let decode_row: RowDecoder = match variant {
            ModelVariant::Detect => decode_detect_row,
            ModelVariant::Pose => decode_pose_row,
        };
        Self {
            variant,
            layout,
            confidence_threshold,
            decode_row,
        }
    }

    /// Create a decoder from the relevant fields of `config`.
    #[must_use]
    pub fn from_config(config: &DecodeConfig) -> Self {
        Self::new(config.variant, config.layout, config.confidence_threshold)
    }

    /// The model variant this decoder parses.
    #[must_use]
    pub const fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Channels expected per anchor row.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.variant.channels()
    }

    /// Interpret a flat tensor as an `[anchors, channels]` view without copying.
    ///
    /// Accepts `[1, a, b]` and `[a, b]` shapes; which axis holds the channels is
    /// fixed by the configured [`TensorLayout`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ShapeError`] if the rank or batch size is
    /// unsupported, the channel count does not match the variant, or the data
    /// length does not match the shape.
    pub fn anchor_view<'a>(&self, output: &'a [f32], shape: &[usize]) -> Result<ArrayView2<'a, f32>> {
        let dims = match *shape {
            [1, a, b] | [a, b] => (a, b),
            [batch, _, _] => {
                return Err(DecodeError::ShapeError(format!(
                    "expected batch size 1, got {batch} (shape {shape:?})"
                )));
            }
            _ => {
                return Err(DecodeError::ShapeError(format!(
                    "expected a [1, C, N] output tensor, got shape {shape:?}"
                )));
            }
        };

        let (channels, anchors) = match self.layout {
            TensorLayout::ChannelsFirst => dims,
            TensorLayout::ChannelsLast => (dims.1, dims.0),
        };

        if channels != self.channels() {
            return Err(DecodeError::ShapeError(format!(
                "{} output expects {} channels per anchor, got {channels} (shape {shape:?}, {})",
                self.variant,
                self.channels(),
                self.layout
            )));
        }

        let expected = channels.checked_mul(anchors).ok_or_else(|| {
            DecodeError::ShapeError(format!("shape {shape:?} overflows the address space"))
        })?;
        if output.len() != expected {
            return Err(DecodeError::ShapeError(format!(
                "tensor has {} values but shape {shape:?} implies {expected}",
                output.len()
            )));
        }

        let view = match self.layout {
            TensorLayout::ChannelsFirst => {
                ArrayView2::from_shape((channels, anchors), output)?.reversed_axes()
            }
            TensorLayout::ChannelsLast => ArrayView2::from_shape((anchors, channels), output)?,
        };
        Ok(view)
    }

    /// Decode a flat output tensor, appending candidates to `out`.
    ///
    /// # Errors
    ///
    /// See [`TensorDecoder::anchor_view`]. Nothing is appended on error.
    pub fn decode_tensor(
        &self,
        output: &[f32],
        shape: &[usize],
        transform: &FrameTransform,
        out: &mut Vec<Detection>,
    ) -> Result<()> {
        let view = self.anchor_view(output, shape)?;
        self.decode_view(view, transform, out)
    }

    /// Decode an `[anchors, channels]` view, appending candidates to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ShapeError`] if the view does not have exactly
    /// [`TensorDecoder::channels`] columns. Nothing is appended on error.
    pub fn decode_view(
        &self,
        view: ArrayView2<'_, f32>,
        transform: &FrameTransform,
        out: &mut Vec<Detection>,
    ) -> Result<()> {
        if view.ncols() != self.channels() {
            return Err(DecodeError::ShapeError(format!(
                "anchor rows have {} values, {} output expects {}",
                view.ncols(),
                self.variant,
                self.channels()
            )));
        }
        self.decode_each(view.rows().into_iter(), transform, out);
        Ok(())
    }

    /// Decode pre-split anchor rows, appending candidates to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ShapeError`] at the first row whose length does
    /// not match the variant's channel count. Candidates decoded from earlier
    /// rows remain in `out`; callers discard it on error.
    pub fn decode_rows<'r, I>(
        &self,
        rows: I,
        transform: &FrameTransform,
        out: &mut Vec<Detection>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = &'r [f32]>,
    {
        let channels = self.channels();
        let mut mismatch = None;

        let checked = rows.into_iter().enumerate().map_while(|(idx, row)| {
            if row.len() == channels {
                Some(ArrayView1::from(row))
            } else {
                mismatch = Some((idx, row.len()));
                None
            }
        });
        self.decode_each(checked, transform, out);

        match mismatch {
            Some((idx, len)) => Err(DecodeError::ShapeError(format!(
                "anchor row {idx} has {len} values, {} output expects {channels}",
                self.variant
            ))),
            None => Ok(()),
        }
    }

    fn decode_each<'v, I>(&self, rows: I, transform: &FrameTransform, out: &mut Vec<Detection>)
    where
        I: Iterator<Item = ArrayView1<'v, f32>>,
    {
        let (decode_row, threshold) = (self.decode_row, self.confidence_threshold);
        out.extend(rows.filter_map(|row| decode_row(row, threshold, transform)));
    }
}

/// Best class index and score; `NaN` scores never win and ties keep the first.
fn best_class(scores: impl Iterator<Item = f32>) -> (usize, f32) {
    scores
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (idx, score)| {
            if score > best.1 { (idx, score) } else { best }
        })
}

fn decode_detect_row(
    row: ArrayView1<'_, f32>,
    threshold: f32,
    transform: &FrameTransform,
) -> Option<Detection> {
    let classes = row.iter().skip(BOX_CHANNELS).take(ModelVariant::Detect.num_classes());
    let (class_id, score) = best_class(classes.copied());
    if score < threshold {
        return None;
    }

    let bbox = transform.map_box(row[0], row[1], row[2], row[3]);
    Some(Detection {
        bbox,
        score,
        class_id,
        label: coco::class_name(class_id),
        keypoints: None,
    })
}

fn decode_pose_row(
    row: ArrayView1<'_, f32>,
    threshold: f32,
    transform: &FrameTransform,
) -> Option<Detection> {
    let score = row[POSE_SCORE_CHANNEL];
    if score.is_nan() || score < threshold {
        return None;
    }

    let bbox = transform.map_box(row[0], row[1], row[2], row[3]);
    Some(Detection::new(bbox, score, 0).with_keypoints(decode_keypoints(row, transform)))
}

/// Decode the 17 keypoints of a pose row.
///
/// Joint `k` is read from channels `5 + 3k .. 5 + 3k + 3`; `x` and `y` go
/// through the same transform as the box, confidence passes through unchanged.
fn decode_keypoints(row: ArrayView1<'_, f32>, transform: &FrameTransform) -> [Keypoint; NUM_KEYPOINTS] {
    std::array::from_fn(|k| {
        let offset = POSE_KEYPOINT_CHANNEL + k * KEYPOINT_DIM;
        Keypoint::new(
            transform.map_x(row[offset]),
            transform.map_y(row[offset + 1]),
            row[offset + 2],
        )
    })
}
