//! Axis-aligned integer boxes and Intersection-over-Union.
//!
//! Edges are inclusive pixel coordinates: a box with `left == right` is one
//! pixel wide. Areas are computed in `i64` so screen-sized boxes never overflow.

/// Axis-aligned bounding box with inclusive integer edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BBox {
    /// Left edge (inclusive).
    pub left: i32,
    /// Right edge (inclusive).
    pub right: i32,
    /// Top edge (inclusive).
    pub top: i32,
    /// Bottom edge (inclusive).
    pub bottom: i32,
}

impl BBox {
    /// Creates a box from two horizontal and two vertical edges, ordering each
    /// pair so that `left <= right` and `top <= bottom`.
    pub fn new(x1: i32, x2: i32, y1: i32, y2: i32) -> Self {
        Self {
            left: x1.min(x2),
            right: x1.max(x2),
            top: y1.min(y2),
            bottom: y1.max(y2),
        }
    }

    /// Creates a box from raw edges without reordering them.
    ///
    /// The caller guarantees `left <= right` and `top <= bottom`; other inputs
    /// yield meaningless areas.
    pub const fn from_edges(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> i64 {
        self.right as i64 - self.left as i64 + 1
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> i64 {
        self.bottom as i64 - self.top as i64 + 1
    }

    /// Returns the area in pixels.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }
}

/// Returns the area of `b` in pixels.
#[inline]
pub fn area(b: &BBox) -> i64 {
    b.area()
}

/// Computes the Intersection-over-Union of two boxes.
///
/// Returns `0.0` as soon as the intersection is empty on either axis, so
/// disjoint boxes never produce negative areas.
#[inline]
pub fn iou(b1: &BBox, b2: &BBox) -> f32 {
    let left = b1.left.max(b2.left);
    let right = b1.right.min(b2.right);
    if left > right {
        return 0.0;
    }

    let top = b1.top.max(b2.top);
    let bottom = b1.bottom.min(b2.bottom);
    if top > bottom {
        return 0.0;
    }

    let inter = BBox::from_edges(left, right, top, bottom).area();
    let union = b1.area() + b2.area() - inter;
    (inter as f64 / union as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::{area, iou, BBox};

    #[test]
    fn area_counts_inclusive_edges() {
        assert_eq!(area(&BBox::from_edges(0, 0, 0, 0)), 1);
        assert_eq!(area(&BBox::from_edges(0, 10, 0, 10)), 121);
        assert_eq!(BBox::from_edges(2, 4, 5, 5).area(), 3);
    }

    #[test]
    fn new_orders_edges() {
        let b = BBox::new(9, 3, 7, 1);
        assert_eq!(b, BBox::from_edges(3, 9, 1, 7));
    }

    #[test]
    fn constructors_share_argument_order() {
        let b = BBox::from_edges(1, 2, 3, 4);
        assert_eq!((b.left, b.right, b.top, b.bottom), (1, 2, 3, 4));
        assert_eq!(BBox::new(1, 2, 3, 4), b);
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = BBox::from_edges(3, 17, 4, 40);
        assert_eq!(iou(&b, &b), 1.0);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BBox::from_edges(0, 10, 0, 10);
        let right_of = BBox::from_edges(11, 20, 0, 10);
        let below = BBox::from_edges(0, 10, 11, 20);
        assert_eq!(iou(&a, &right_of), 0.0);
        assert_eq!(iou(&a, &below), 0.0);
    }

    #[test]
    fn iou_of_shifted_box_matches_hand_computation() {
        let a = BBox::from_edges(0, 10, 0, 10);
        let b = BBox::from_edges(1, 11, 0, 10);
        // 110 / (121 + 121 - 110)
        let expected = 110.0f32 / 132.0f32;
        assert!((iou(&a, &b) - expected).abs() < 1e-6);
        assert_eq!(iou(&a, &b), iou(&b, &a));
    }

    #[test]
    fn touching_edges_overlap_by_one_pixel_column() {
        let a = BBox::from_edges(0, 10, 0, 0);
        let b = BBox::from_edges(10, 20, 0, 0);
        assert!((iou(&a, &b) - 1.0 / 21.0).abs() < 1e-6);
    }
}
