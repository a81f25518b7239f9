//! Axis-aligned bounding boxes and Intersection-over-Union.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel coordinates.
///
/// Stored as top-left corner plus extent, the layout detectors in the
/// COCO family report (`[x, y, width, height]`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a box from its min and max corners.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Right edge.
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn y2(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Center point as `(cx, cy)`.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when the box covers no area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Area of the overlap with `other`, clipped to zero when disjoint.
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let inter_w = (self.x2().min(other.x2()) - self.x.max(other.x)).max(0.0);
        let inter_h = (self.y2().min(other.y2()) - self.y.max(other.y)).max(0.0);
        inter_w * inter_h
    }

    /// Intersection over Union with `other`.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        iou(self, other)
    }

    /// Flatten to `[x, y, width, height]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Intersection over Union of two boxes, in `[0, 1]`.
///
/// Returns 0 when the union has no positive area (both boxes degenerate),
/// so the result is always defined.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let inter_area = a.intersection_area(b);
    let union_area = a.area() + b.area() - inter_area;

    if union_area > 0.0 {
        (inter_area / union_area).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// IoU for every `(row, col)` pair.
///
/// Entry `(i, j)` is `iou(rows[i], cols[j])`.
pub fn iou_matrix(rows: &[BoundingBox], cols: &[BoundingBox]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), cols.len(), |i, j| iou(&rows[i], &cols[j]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_iou_perfect_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(iou(&a, &a), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 10.0, 10.0);
        assert_relative_eq!(iou(&a, &b), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_iou_touching_edges() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(10.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(iou(&a, &b), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 10.0, 10.0);
        // Intersection: 5x5 = 25, Union: 100 + 100 - 25 = 175
        assert_relative_eq!(iou(&a, &b), 25.0 / 175.0, epsilon = 1e-10);
    }

    #[test]
    fn test_iou_contained() {
        let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let inner = BoundingBox::new(2.0, 2.0, 5.0, 5.0);
        assert_relative_eq!(iou(&outer, &inner), 25.0 / 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_iou_symmetric() {
        let boxes = [
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(3.0, -2.0, 7.0, 20.0),
            BoundingBox::new(100.0, 50.0, 1.0, 1.0),
            BoundingBox::new(4.5, 4.5, 0.0, 3.0),
        ];
        for a in &boxes {
            for b in &boxes {
                assert_eq!(iou(a, b), iou(b, a));
            }
        }
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let line = BoundingBox::new(5.0, 5.0, 0.0, 10.0);
        let point = BoundingBox::new(5.0, 5.0, 0.0, 0.0);
        let normal = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

        assert_eq!(iou(&point, &point), 0.0);
        assert_eq!(iou(&line, &line), 0.0);
        assert_eq!(iou(&line, &normal), 0.0);
        assert!(point.is_degenerate());
        assert!(!normal.is_degenerate());
    }

    #[test]
    fn test_from_corners() {
        let b = BoundingBox::from_corners(1.0, 2.0, 4.0, 8.0);
        assert_eq!(b, BoundingBox::new(1.0, 2.0, 3.0, 6.0));
        assert_eq!(b.x2(), 4.0);
        assert_eq!(b.y2(), 8.0);
        assert_eq!(b.center(), (2.5, 5.0));
    }

    #[test]
    fn test_iou_matrix_shape_and_values() {
        let rows = [
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(50.0, 50.0, 10.0, 10.0),
        ];
        let cols = [
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(5.0, 5.0, 10.0, 10.0),
            BoundingBox::new(50.0, 50.0, 10.0, 10.0),
        ];
        let m = iou_matrix(&rows, &cols);

        assert_eq!(m.shape(), (2, 3));
        assert_relative_eq!(m[(0, 0)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(m[(0, 1)], 25.0 / 175.0, epsilon = 1e-10);
        assert_relative_eq!(m[(0, 2)], 0.0, epsilon = 1e-10);
        assert_relative_eq!(m[(1, 2)], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_iou_matrix_empty() {
        let m = iou_matrix(&[], &[BoundingBox::new(0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(m.shape(), (0, 1));
    }
}
