use crate::shared::rectangle::Rectangle;

/// One level of a downsampling image pyramid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PyramidLevel {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl PyramidLevel {
    /// Maps an inclusive rectangle in this level's coordinates back onto
    /// the full-size image.
    pub fn to_original(&self, rect: Rectangle) -> Rectangle {
        Rectangle::new(
            (rect.left as f64 / self.scale_x).round() as i64,
            (rect.top as f64 / self.scale_y).round() as i64,
            ((rect.right + 1) as f64 / self.scale_x).round() as i64 - 1,
            ((rect.bottom + 1) as f64 / self.scale_y).round() as i64 - 1,
        )
    }
}

/// Pyramid where each level is `(N-1)/N` the size of the one above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PyramidDown {
    downsample: u32,
}

impl PyramidDown {
    /// `downsample` is clamped to at least 2 (halving per level).
    pub fn new(downsample: u32) -> Self {
        Self {
            downsample: downsample.max(2),
        }
    }

    pub fn next_size(&self, width: u32, height: u32) -> (u32, u32) {
        let n = self.downsample as u64;
        (
            (width as u64 * (n - 1) / n) as u32,
            (height as u64 * (n - 1) / n) as u32,
        )
    }

    /// Levels from full size downward while each is at least
    /// `min_width` x `min_height`, capped at `max_levels`.
    pub fn levels(
        &self,
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
        max_levels: usize,
    ) -> Vec<PyramidLevel> {
        let min_width = min_width.max(1);
        let min_height = min_height.max(1);
        let mut levels = Vec::new();
        let (mut w, mut h) = (width, height);
        while levels.len() < max_levels && w >= min_width && h >= min_height {
            levels.push(PyramidLevel {
                index: levels.len(),
                width: w,
                height: h,
                scale_x: w as f64 / width as f64,
                scale_y: h as f64 / height as f64,
            });
            (w, h) = self.next_size(w, h);
        }
        levels
    }
}
