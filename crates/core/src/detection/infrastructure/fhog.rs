//! Felzenszwalb HOG features.
//!
//! Each `cell_size` x `cell_size` cell yields 31 values: 18 contrast-sensitive
//! orientation bins, 9 contrast-insensitive bins, and 4 texture-gradient
//! energies, all normalized against the four 2x2 blocks touching the cell.

use std::f32::consts::PI;

use ndarray::Array3;

use crate::shared::constants::FHOG_FEATURES;
use crate::shared::pixel_matrix::PixelMatrix;

const SIGNED_BINS: usize = 18;
const UNSIGNED_BINS: usize = 9;
const TRUNCATION: f32 = 0.2;
const TEXTURE_SCALE: f32 = 0.2357;
const NORM_EPS: f32 = 0.0001;

/// Computes FHOG feature maps, reusing its histogram buffers across calls.
pub struct FhogExtractor {
    cell_size: usize,
    unit_vectors: [(f32, f32); UNSIGNED_BINS],
    hist: Vec<f32>,
    energy: Vec<f32>,
}

impl FhogExtractor {
    pub fn new(cell_size: usize) -> Self {
        let mut unit_vectors = [(0.0, 0.0); UNSIGNED_BINS];
        for (o, v) in unit_vectors.iter_mut().enumerate() {
            let angle = o as f32 * PI / UNSIGNED_BINS as f32;
            *v = (angle.cos(), angle.sin());
        }
        Self {
            cell_size: cell_size.max(1),
            unit_vectors,
            hist: Vec::new(),
            energy: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    /// `(cells_high, cells_wide, 31)` feature map. Partial cells at the
    /// right and bottom edges are dropped.
    pub fn extract(&mut self, image: &PixelMatrix) -> Array3<f32> {
        let cells_w = image.width() as usize / self.cell_size;
        let cells_h = image.height() as usize / self.cell_size;
        let mut features = Array3::<f32>::zeros((cells_h, cells_w, FHOG_FEATURES));
        if cells_w == 0 || cells_h == 0 {
            return features;
        }

        self.hist.clear();
        self.hist.resize(cells_h * cells_w * SIGNED_BINS, 0.0);
        self.energy.clear();
        self.energy.resize(cells_h * cells_w, 0.0);

        self.accumulate_histograms(image, cells_w, cells_h);
        self.compute_energy();

        for cy in 0..cells_h {
            for cx in 0..cells_w {
                self.write_cell(&mut features, cx, cy, cells_w, cells_h);
            }
        }
        features
    }

    fn accumulate_histograms(&mut self, image: &PixelMatrix, cells_w: usize, cells_h: usize) {
        let px = image.as_ndarray();
        let w = cells_w * self.cell_size;
        let h = cells_h * self.cell_size;
        let img_w = image.width() as usize;
        let img_h = image.height() as usize;

        for y in 1..h.min(img_h - 1) {
            for x in 1..w.min(img_w - 1) {
                // Gradient of the channel with the strongest response.
                let mut best = (0.0f32, 0.0f32, 0.0f32);
                for c in 0..3 {
                    let dx = px[[y, x + 1, c]] as f32 - px[[y, x - 1, c]] as f32;
                    let dy = px[[y + 1, x, c]] as f32 - px[[y - 1, x, c]] as f32;
                    let mag = dx * dx + dy * dy;
                    if mag > best.2 {
                        best = (dx, dy, mag);
                    }
                }
                let (dx, dy, mag) = best;
                if mag == 0.0 {
                    continue;
                }

                let mut best_dot = 0.0f32;
                let mut best_bin = 0usize;
                for (o, &(u, v)) in self.unit_vectors.iter().enumerate() {
                    let dot = u * dx + v * dy;
                    if dot > best_dot {
                        best_dot = dot;
                        best_bin = o;
                    } else if -dot > best_dot {
                        best_dot = -dot;
                        best_bin = o + UNSIGNED_BINS;
                    }
                }

                let cell = (y / self.cell_size) * cells_w + x / self.cell_size;
                self.hist[cell * SIGNED_BINS + best_bin] += mag.sqrt();
            }
        }
    }

    fn compute_energy(&mut self) {
        for (cell, e) in self.energy.iter_mut().enumerate() {
            let bins = &self.hist[cell * SIGNED_BINS..(cell + 1) * SIGNED_BINS];
            *e = (0..UNSIGNED_BINS)
                .map(|o| {
                    let s = bins[o] + bins[o + UNSIGNED_BINS];
                    s * s
                })
                .sum();
        }
    }

    fn write_cell(
        &self,
        features: &mut Array3<f32>,
        cx: usize,
        cy: usize,
        cells_w: usize,
        cells_h: usize,
    ) {
        let cell = cy * cells_w + cx;
        let bins = &self.hist[cell * SIGNED_BINS..(cell + 1) * SIGNED_BINS];
        if bins.iter().all(|&b| b == 0.0) {
            return;
        }

        let energy_at = |x: isize, y: isize| -> f32 {
            if x < 0 || y < 0 || x as usize >= cells_w || y as usize >= cells_h {
                0.0
            } else {
                self.energy[y as usize * cells_w + x as usize]
            }
        };
        let block = |x0: isize, y0: isize| -> f32 {
            let e = energy_at(x0, y0)
                + energy_at(x0 + 1, y0)
                + energy_at(x0, y0 + 1)
                + energy_at(x0 + 1, y0 + 1);
            1.0 / (e + NORM_EPS).sqrt()
        };
        let (x, y) = (cx as isize, cy as isize);
        let norms = [
            block(x - 1, y - 1),
            block(x, y - 1),
            block(x - 1, y),
            block(x, y),
        ];

        let mut texture = [0.0f32; 4];
        for o in 0..SIGNED_BINS {
            let mut sum = 0.0;
            for (t, n) in texture.iter_mut().zip(norms) {
                let h = (bins[o] * n).min(TRUNCATION);
                sum += h;
                *t += h;
            }
            features[[cy, cx, o]] = 0.5 * sum;
        }
        for o in 0..UNSIGNED_BINS {
            let combined = bins[o] + bins[o + UNSIGNED_BINS];
            let sum: f32 = norms.iter().map(|n| (combined * n).min(TRUNCATION)).sum();
            features[[cy, cx, SIGNED_BINS + o]] = 0.5 * sum;
        }
        for (i, t) in texture.iter().enumerate() {
            features[[cy, cx, SIGNED_BINS + UNSIGNED_BINS + i]] = TEXTURE_SCALE * t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn uniform(width: u32, height: u32, value: u8) -> PixelMatrix {
        PixelMatrix::from(RgbImage::from_pixel(width, height, Rgb([value; 3])))
    }

    /// Black image with a white vertical band covering columns `x0..x1`.
    fn vertical_band(width: u32, height: u32, x0: u32, x1: u32) -> PixelMatrix {
        let mut img = RgbImage::from_pixel(width, height, Rgb([0; 3]));
        for y in 0..height {
            for x in x0..x1 {
                img.put_pixel(x, y, Rgb([255; 3]));
            }
        }
        PixelMatrix::from(img)
    }

    #[test]
    fn test_feature_map_shape_drops_partial_cells() {
        let features = FhogExtractor::new(8).extract(&uniform(70, 45, 0));
        assert_eq!(features.shape(), &[5, 8, FHOG_FEATURES]);
    }

    #[test]
    fn test_image_smaller_than_a_cell_yields_empty_map() {
        let features = FhogExtractor::new(8).extract(&uniform(7, 30, 0));
        assert_eq!(features.shape(), &[3, 0, FHOG_FEATURES]);
    }

    #[test]
    fn test_uniform_image_has_zero_features() {
        let features = FhogExtractor::new(8).extract(&uniform(64, 64, 200));
        assert!(features.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_edges_only_activate_their_cells() {
        // Edge at x=32: gradient pixels at x=31 and x=32, cells 3 and 4.
        let features = FhogExtractor::new(8).extract(&vertical_band(64, 32, 32, 64));
        for cx in 0..8 {
            let cell_sum: f32 = features.slice(ndarray::s![1, cx, ..]).sum();
            if cx == 3 || cx == 4 {
                assert!(cell_sum > 0.0, "cell {cx} should be active");
            } else {
                assert_eq!(cell_sum, 0.0, "cell {cx} should be empty");
            }
        }
    }

    #[test]
    fn test_features_are_bounded_and_non_negative() {
        let features = FhogExtractor::new(8).extract(&vertical_band(64, 64, 20, 40));
        for &f in features.iter() {
            assert!(f >= 0.0);
            assert!(f < 1.0);
        }
    }

    #[test]
    fn test_horizontal_gradient_lands_in_horizontal_bin() {
        // Dark-to-bright left to right: gradient points along +x, bin 0.
        let features = FhogExtractor::new(8).extract(&vertical_band(64, 32, 32, 64));
        let cell = features.slice(ndarray::s![1, 3, ..]);
        let strongest = (0..SIGNED_BINS)
            .max_by(|&a, &b| cell[a].total_cmp(&cell[b]))
            .unwrap();
        assert_eq!(strongest, 0);
        assert!(cell[SIGNED_BINS] > 0.0); // insensitive bin 0 follows
    }

    #[test]
    fn test_extract_is_repeatable_with_reused_buffers() {
        let mut extractor = FhogExtractor::new(8);
        let a = extractor.extract(&vertical_band(64, 64, 16, 48));
        let _ = extractor.extract(&uniform(128, 16, 90));
        let b = extractor.extract(&vertical_band(64, 64, 16, 48));
        assert_eq!(a, b);
    }
}
