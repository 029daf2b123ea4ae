//! Intersection-over-union and non-maximum suppression over axis-aligned
//! boxes.

use super::TextRegion;

/// Anything that can be viewed as an axis-aligned `[x1, y1, x2, y2]` box.
pub trait AxisAlignedBox {
    /// Corners as `[x1, y1, x2, y2]`.
    fn corners(&self) -> [f32; 4];

    /// Signed area; negative for inverted boxes.
    fn area(&self) -> f32 {
        let [x1, y1, x2, y2] = self.corners();
        (x2 - x1) * (y2 - y1)
    }
}

impl AxisAlignedBox for [f32; 4] {
    fn corners(&self) -> [f32; 4] {
        *self
    }
}

impl AxisAlignedBox for TextRegion {
    fn corners(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Candidate box produced by the detector before suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
}

impl AxisAlignedBox for Proposal {
    fn corners(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl From<Proposal> for TextRegion {
    fn from(p: Proposal) -> Self {
        TextRegion {
            x1: p.x1,
            y1: p.y1,
            x2: p.x2,
            y2: p.y2,
            confidence: p.score,
        }
    }
}

/// Intersection over union of two boxes.
///
/// Returns exactly `0.0` when the boxes do not overlap.
pub fn compute_iou<A: AxisAlignedBox + ?Sized, B: AxisAlignedBox + ?Sized>(a: &A, b: &B) -> f32 {
    let [ax1, ay1, ax2, ay2] = a.corners();
    let [bx1, by1, bx2, by2] = b.corners();

    let x1 = ax1.max(bx1);
    let y1 = ay1.max(by1);
    let x2 = ax2.min(bx2);
    let y2 = ay2.min(by2);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let intersection = (x2 - x1) * (y2 - y1);
    intersection / (a.area() + b.area() - intersection)
}

/// Greedy non-maximum suppression.
///
/// Boxes are visited in descending score order; a kept box suppresses every
/// later box whose IoU with it is strictly greater than `iou_threshold`.
/// The kept boxes are returned in descending score order.
pub fn apply_nms(mut boxes: Vec<Proposal>, iou_threshold: f32) -> Vec<Proposal> {
    if boxes.is_empty() {
        return boxes;
    }

    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for i in 0..boxes.len() {
        if suppressed[i] {
            continue;
        }
        kept.push(boxes[i]);
        for j in (i + 1)..boxes.len() {
            if !suppressed[j] && compute_iou(&boxes[i], &boxes[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    kept
}
