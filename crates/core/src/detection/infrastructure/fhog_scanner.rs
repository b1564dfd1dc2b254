use std::path::Path;

use ndarray::{s, Array3, Zip};

use crate::detection::domain::object_scanner::{Detection, ObjectScanner, ScanError};
use crate::detection::domain::overlap_tester::OverlapTester;
use crate::shared::pixel_matrix::PixelMatrix;
use crate::shared::rectangle::Rectangle;

use super::detector_model::{DetectorModel, ModelError};
use super::fhog::FhogExtractor;
use super::image_pyramid::{PyramidDown, PyramidLevel};

/// Sliding-window FHOG detector over a `(N-1)/N` image pyramid.
pub struct FhogScanner {
    extractor: FhogExtractor,
    filter: Array3<f32>,
    window: (u32, u32),
    bias: f64,
    threshold: f64,
    pyramid: PyramidDown,
    max_pyramid_levels: usize,
    overlap: OverlapTester,
}

impl FhogScanner {
    /// Builds a scanner from an already-loaded model. Only the filter shape
    /// is checked here; [`DetectorModel::load`] performs full validation.
    pub fn new(model: &DetectorModel) -> Result<Self, ModelError> {
        Ok(Self {
            extractor: FhogExtractor::new(model.cell_size),
            filter: model.filter()?,
            window: model.window_size()?,
            bias: model.bias,
            threshold: model.threshold,
            pyramid: PyramidDown::new(model.pyramid_downsample),
            max_pyramid_levels: model.max_pyramid_levels,
            overlap: model.overlap,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        Self::new(&DetectorModel::load(path)?)
    }

    /// Detection window in pixels, `(width, height)`.
    pub fn window_size(&self) -> (u32, u32) {
        self.window
    }

    fn score_windows(
        &self,
        features: &Array3<f32>,
        level: &PyramidLevel,
        out: &mut Vec<Detection>,
    ) -> Result<(), ScanError> {
        let (rows, cols, _) = features.dim();
        let (filter_rows, filter_cols, _) = self.filter.dim();
        if rows < filter_rows || cols < filter_cols {
            return Ok(());
        }
        let cell = self.extractor.cell_size() as i64;

        for y in 0..=rows - filter_rows {
            for x in 0..=cols - filter_cols {
                let window = features.slice(s![y..y + filter_rows, x..x + filter_cols, ..]);
                let response = Zip::from(&window)
                    .and(&self.filter)
                    .fold(0.0f64, |acc, &f, &w| acc + (f * w) as f64);
                let score = response - self.bias;
                if !score.is_finite() {
                    return Err(ScanError::NonFiniteScore { level: level.index });
                }
                if score >= self.threshold {
                    let rect = Rectangle::new(
                        x as i64 * cell,
                        y as i64 * cell,
                        (x + filter_cols) as i64 * cell - 1,
                        (y + filter_rows) as i64 * cell - 1,
                    );
                    out.push(Detection {
                        rect: level.to_original(rect),
                        score,
                    });
                }
            }
        }
        Ok(())
    }
}

impl ObjectScanner for FhogScanner {
    fn scan(&mut self, image: &PixelMatrix) -> Result<Vec<Detection>, ScanError> {
        if image.is_empty() {
            return Err(ScanError::EmptyImage);
        }
        let (win_w, win_h) = self.window_size();
        let levels = self.pyramid.levels(
            image.width(),
            image.height(),
            win_w,
            win_h,
            self.max_pyramid_levels,
        );

        let mut candidates = Vec::new();
        for level in &levels {
            let features = if level.index == 0 {
                self.extractor.extract(image)
            } else {
                self.extractor
                    .extract(&image.resized(level.width, level.height))
            };
            self.score_windows(&features, level, &mut candidates)?;
        }

        let found = candidates.len();
        let kept = self.overlap.suppress(candidates);
        log::debug!(
            "Scanned {}x{} image over {} pyramid levels: {} candidates, {} after suppression",
            image.width(),
            image.height(),
            levels.len(),
            found,
            kept.len()
        );
        Ok(kept)
    }
}
