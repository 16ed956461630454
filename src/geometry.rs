// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Axis-aligned box geometry: area, intersection, union and `IoU`.

use serde::Serialize;

/// Axis-aligned bounding box in absolute pixel coordinates `[x1, y1, x2, y2]`.
///
/// Boxes built with [`BoundingBox::from_center`] from a non-negative size
/// satisfy `x1 <= x2` and `y1 <= y2`. Nothing keeps a box inside the frame;
/// use [`BoundingBox::clip`] when that matters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl BoundingBox {
    /// Create a box from corner coordinates.
    #[must_use]
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from center/size (`xywh`) form.
    #[must_use]
    pub fn from_center(xc: f32, yc: f32, w: f32, h: f32) -> Self {
        Self {
            x1: xc - w / 2.0,
            y1: yc - h / 2.0,
            x2: xc + w / 2.0,
            y2: yc + h / 2.0,
        }
    }

    /// Box width, zero for inverted boxes.
    #[must_use]
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Box height, zero for inverted boxes.
    #[must_use]
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Box area.
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Box center `(cx, cy)`.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Corners as `[x1, y1, x2, y2]`.
    #[must_use]
    pub const fn xyxy(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Clamp the box to a `width` x `height` frame.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn clip(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }

    /// Overlap area with `other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> f32 {
        intersection(self, other)
    }

    /// Intersection over union with `other`.
    #[must_use]
    pub fn iou(&self, other: &Self) -> f32 {
        iou(self, other)
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(xyxy: [f32; 4]) -> Self {
        Self::new(xyxy[0], xyxy[1], xyxy[2], xyxy[3])
    }
}

/// Overlap area of two boxes, zero when they do not overlap on either axis.
#[must_use]
pub fn intersection(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
}

/// Union area: `area(a) + area(b) - intersection(a, b)`.
#[must_use]
pub fn union(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.area() + b.area() - intersection(a, b)
}

/// Calculate `IoU` (Intersection over Union) between two boxes.
///
/// Returns exactly `0.0` when the union is not positive (zero-area or
/// degenerate pairs), so the result is never `NaN` for finite input.
#[must_use]
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let inter = intersection(a, b);
    let union = a.area() + b.area() - inter;

    if union > 0.0 { inter / union } else { 0.0 }
}
