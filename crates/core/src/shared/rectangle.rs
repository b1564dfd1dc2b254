use serde::Serialize;

/// Axis-aligned box in image pixel coordinates, inclusive on all four edges.
///
/// Field order defines the derived ordering: rectangles compare
/// lexicographically by `(left, top, right, bottom)`. `left <= right` and
/// `top <= bottom` are expected but not enforced; detector output is
/// trusted as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Rectangle {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Rectangle {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Zero for inverted rectangles. Saturates at `i64::MAX`.
    pub fn width(&self) -> i64 {
        self.right.saturating_sub(self.left).saturating_add(1).max(0)
    }

    pub fn height(&self) -> i64 {
        self.bottom.saturating_sub(self.top).saturating_add(1).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width().saturating_mul(self.height())
    }

    pub fn intersection(&self, other: &Rectangle) -> Rectangle {
        Rectangle {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        }
    }

    /// `[left, top, right, bottom]`, the order rectangles are marshaled in.
    pub fn to_array(&self) -> [i64; 4] {
        [self.left, self.top, self.right, self.bottom]
    }
}
