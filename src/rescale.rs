// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Mapping from decode-input coordinates back to original-frame pixels.
//!
//! The model sees a `input_w` x `input_h` image produced from the original frame
//! by one of two resize strategies:
//!
//! - [`ResizeMode::Stretch`]: plain per-axis resize. Coordinates map back with
//!   `x / input_w * img_w` and `y / input_h * img_h`, applied as a precomputed
//!   per-axis scale. This distorts non-square frames, and the decoder preserves
//!   that transform exactly so the boxes line up with a plain-resized tensor.
//! - [`ResizeMode::Letterbox`]: aspect-preserving resize with centered padding,
//!   as in Ultralytics preprocessing.
//!
//! The transform must match whatever preprocessing produced the tensor.

use std::fmt;
use std::str::FromStr;

use crate::error::{DecodeError, Result};
use crate::geometry::BoundingBox;

/// How the original frame was resized to the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Independent per-axis scaling without padding.
    #[default]
    Stretch,
    /// Aspect-preserving scaling with centered padding.
    Letterbox,
}

impl ResizeMode {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stretch => "stretch",
            Self::Letterbox => "letterbox",
        }
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResizeMode {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stretch" | "plain" | "resize" => Ok(Self::Stretch),
            "letterbox" | "pad" => Ok(Self::Letterbox),
            _ => Err(DecodeError::ConfigError(format!(
                "invalid resize mode '{s}', expected one of: stretch, letterbox"
            ))),
        }
    }
}

/// Original frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
}

impl FrameSize {
    /// Create a frame size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for FrameSize {
    type Err = DecodeError;

    /// Parse `WIDTHxHEIGHT`, e.g. `1280x720`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DecodeError::ConfigError(format!("invalid frame size '{s}', expected WxH"));
        let (w, h) = s.to_lowercase().split_once('x').ok_or_else(invalid).and_then(|(w, h)| {
            let w = w.trim().parse::<u32>().map_err(|_| invalid())?;
            let h = h.trim().parse::<u32>().map_err(|_| invalid())?;
            Ok((w, h))
        })?;
        Ok(Self::new(w, h))
    }
}

/// Resolved coordinate transform for one frame.
///
/// Built once per decode call and applied to every box and keypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    mode: ResizeMode,
    /// Stretch scale (`img_w / input_w`, `img_h / input_h`).
    scale: (f32, f32),
    /// Letterbox gain (`gain_x`, `gain_y`).
    gain: (f32, f32),
    /// Letterbox padding (`pad_left`, `pad_top`).
    padding: (f32, f32),
}

impl FrameTransform {
    /// Resolve the transform for `frame` and a model input of `imgsz` (height, width).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ConfigError`] if either size has a zero extent.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(mode: ResizeMode, imgsz: (usize, usize), frame: FrameSize) -> Result<Self> {
        let (input_h, input_w) = imgsz;
        if input_h == 0 || input_w == 0 {
            return Err(DecodeError::ConfigError(format!(
                "input size must be positive, got {input_w}x{input_h}"
            )));
        }
        if frame.width == 0 || frame.height == 0 {
            return Err(DecodeError::ConfigError(format!(
                "frame size must be positive, got {frame}"
            )));
        }

        let (gain, padding) = match mode {
            ResizeMode::Stretch => ((1.0, 1.0), (0.0, 0.0)),
            ResizeMode::Letterbox => letterbox_params(frame, imgsz),
        };

        Ok(Self {
            mode,
            scale: (
                frame.width as f32 / input_w as f32,
                frame.height as f32 / input_h as f32,
            ),
            gain,
            padding,
        })
    }

    /// The resize mode this transform inverts.
    #[must_use]
    pub const fn mode(&self) -> ResizeMode {
        self.mode
    }

    /// Map an input-space x coordinate to frame pixels.
    #[inline]
    #[must_use]
    pub fn map_x(&self, x: f32) -> f32 {
        match self.mode {
            ResizeMode::Stretch => x * self.scale.0,
            ResizeMode::Letterbox => (x - self.padding.0) / self.gain.0,
        }
    }

    /// Map an input-space y coordinate to frame pixels.
    #[inline]
    #[must_use]
    pub fn map_y(&self, y: f32) -> f32 {
        match self.mode {
            ResizeMode::Stretch => y * self.scale.1,
            ResizeMode::Letterbox => (y - self.padding.1) / self.gain.1,
        }
    }

    /// Convert a center/size box in input space to a frame-space corner box.
    #[inline]
    #[must_use]
    pub fn map_box(&self, xc: f32, yc: f32, w: f32, h: f32) -> BoundingBox {
        let b = BoundingBox::from_center(xc, yc, w, h);
        BoundingBox::new(self.map_x(b.x1), self.map_y(b.y1), self.map_x(b.x2), self.map_y(b.y2))
    }
}

/// Calculate letterbox gain and padding.
///
/// Returns `((gain_x, gain_y), (pad_left, pad_top))`. The gain is the realised
/// scale after rounding the resized extent to whole pixels, and the padding is
/// split evenly with the odd pixel on the right/bottom.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn letterbox_params(frame: FrameSize, imgsz: (usize, usize)) -> ((f32, f32), (f32, f32)) {
    let (target_h, target_w) = (imgsz.0 as f32, imgsz.1 as f32);
    let (orig_w, orig_h) = (frame.width as f32, frame.height as f32);

    let scale = (target_h / orig_h).min(target_w / orig_w);

    let new_w = ((orig_w * scale).round() as u32).max(1);
    let new_h = ((orig_h * scale).round() as u32).max(1);

    let pad_left = (imgsz.1 as u32).saturating_sub(new_w) / 2;
    let pad_top = (imgsz.0 as u32).saturating_sub(new_h) / 2;

    (
        (new_w as f32 / orig_w, new_h as f32 / orig_h),
        (pad_left as f32, pad_top as f32),
    )
}
