use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::overlap_tester::OverlapTester;
use crate::shared::constants::{
    DEFAULT_CELL_SIZE, DEFAULT_MAX_PYRAMID_LEVELS, DEFAULT_PYRAMID_DOWNSAMPLE, FHOG_FEATURES,
    MODEL_FORMAT_VERSION,
};
use crate::shared::error_kind::ErrorKind;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("unable to open model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to deserialize model {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported model format version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("invalid model: {0}")]
    Invalid(String),
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Serialization
    }
}

/// Serialized FHOG detector: a linear filter over cell features plus the
/// parameters that control how it is scanned across an image.
///
/// Stored as JSON. Fields after `bias` are optional in files and fall back
/// to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorModel {
    pub format_version: u32,
    pub cell_size: usize,
    pub filter_rows: usize,
    pub filter_cols: usize,
    /// Row-major `filter_rows x filter_cols x 31`.
    pub weights: Vec<f32>,
    pub bias: f64,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default = "default_pyramid_downsample")]
    pub pyramid_downsample: u32,
    #[serde(default = "default_max_pyramid_levels")]
    pub max_pyramid_levels: usize,
    #[serde(default)]
    pub overlap: OverlapTester,
}

fn default_pyramid_downsample() -> u32 {
    DEFAULT_PYRAMID_DOWNSAMPLE
}

fn default_max_pyramid_levels() -> usize {
    DEFAULT_MAX_PYRAMID_LEVELS
}

impl DetectorModel {
    /// Builds a model around a `(rows, cols, 31)` filter with default
    /// scanning parameters.
    pub fn from_filter(filter: Array3<f32>, bias: f64) -> Self {
        let (filter_rows, filter_cols, _) = filter.dim();
        Self {
            format_version: MODEL_FORMAT_VERSION,
            cell_size: DEFAULT_CELL_SIZE,
            filter_rows,
            filter_cols,
            weights: filter.iter().copied().collect(),
            bias,
            threshold: 0.0,
            pyramid_downsample: DEFAULT_PYRAMID_DOWNSAMPLE,
            max_pyramid_levels: DEFAULT_MAX_PYRAMID_LEVELS,
            overlap: OverlapTester::default(),
        }
    }

    pub fn with_cell_size(mut self, cell_size: usize) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_pyramid_downsample(mut self, downsample: u32) -> Self {
        self.pyramid_downsample = downsample;
        self
    }

    pub fn with_max_pyramid_levels(mut self, levels: usize) -> Self {
        self.max_pyramid_levels = levels;
        self
    }

    pub fn with_overlap(mut self, overlap: OverlapTester) -> Self {
        self.overlap = overlap;
        self
    }

    /// Reads and validates a model file. Every failure, a missing file
    /// included, is a [`ModelError`].
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file = File::open(path).map_err(|e| ModelError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let model: DetectorModel =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| ModelError::Format {
                path: path.to_path_buf(),
                source: e,
            })?;
        model.validate()?;
        log::info!(
            "Loaded detector model {} ({}x{} cells, cell size {})",
            path.display(),
            model.filter_rows,
            model.filter_cols,
            model.cell_size
        );
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let write_err = |e: std::io::Error| ModelError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(write_err)?);
        serde_json::to_writer(&mut writer, self).map_err(|e| ModelError::Write {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        writer.flush().map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelError::Version {
                found: self.format_version,
                expected: MODEL_FORMAT_VERSION,
            });
        }
        if self.cell_size == 0 {
            return Err(ModelError::Invalid("cell_size must be at least 1".into()));
        }
        if self.filter_rows == 0 || self.filter_cols == 0 {
            return Err(ModelError::Invalid(format!(
                "filter must be at least 1x1 cells, got {}x{}",
                self.filter_rows, self.filter_cols
            )));
        }
        self.window_size()?;
        let expected = self
            .filter_rows
            .checked_mul(self.filter_cols)
            .and_then(|cells| cells.checked_mul(FHOG_FEATURES))
            .ok_or_else(|| ModelError::Invalid("filter dimensions overflow".into()))?;
        if self.weights.len() != expected {
            return Err(ModelError::Invalid(format!(
                "expected {expected} weights, found {}",
                self.weights.len()
            )));
        }
        if self.weights.iter().any(|w| !w.is_finite())
            || !self.bias.is_finite()
            || !self.threshold.is_finite()
        {
            return Err(ModelError::Invalid(
                "weights, bias and threshold must be finite".into(),
            ));
        }
        if self.pyramid_downsample < 2 {
            return Err(ModelError::Invalid(
                "pyramid_downsample must be at least 2".into(),
            ));
        }
        if self.max_pyramid_levels == 0 {
            return Err(ModelError::Invalid(
                "max_pyramid_levels must be at least 1".into(),
            ));
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&self.overlap.iou_thresh)
            || !unit.contains(&self.overlap.percent_covered_thresh)
        {
            return Err(ModelError::Invalid(
                "overlap thresholds must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// The weights as a `(rows, cols, 31)` array.
    pub fn filter(&self) -> Result<Array3<f32>, ModelError> {
        Array3::from_shape_vec(
            (self.filter_rows, self.filter_cols, FHOG_FEATURES),
            self.weights.clone(),
        )
        .map_err(|e| ModelError::Invalid(e.to_string()))
    }

    /// Detection window in pixels, `(width, height)`. Fails when either
    /// side does not fit in a `u32`.
    pub fn window_size(&self) -> Result<(u32, u32), ModelError> {
        let side = |cells: usize| {
            cells
                .checked_mul(self.cell_size)
                .and_then(|px| u32::try_from(px).ok())
                .ok_or_else(|| {
                    ModelError::Invalid(format!(
                        "detection window of {cells} cells of {} px overflows",
                        self.cell_size
                    ))
                })
        };
        Ok((side(self.filter_cols)?, side(self.filter_rows)?))
    }
}
