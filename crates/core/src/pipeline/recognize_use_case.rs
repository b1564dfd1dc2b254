use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::decoding::image_decoder::{self, DecodeError};
use crate::detection::detection_engine::DetectionEngine;
use crate::detection::domain::object_scanner::ScanError;
use crate::shared::error_kind::ErrorKind;
use crate::shared::pixel_matrix::PixelMatrix;
use crate::shared::rectangle::Rectangle;

#[derive(Error, Debug)]
pub enum RecognizeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl RecognizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecognizeError::Read { .. } => ErrorKind::ImageLoad,
            RecognizeError::Decode(e) => e.kind(),
            RecognizeError::Scan(e) => e.kind(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecognizeOptions {
    /// Convert to luma before scanning.
    pub grayscale: bool,
    /// Turn the image upright per its EXIF orientation tag before scanning.
    /// Rectangles are then in the rotated image's coordinates.
    pub auto_orient: bool,
}

/// The decoded image together with what was found in it.
#[derive(Clone, Debug, PartialEq)]
pub struct Recognition {
    pub image: PixelMatrix,
    pub rects: Vec<Rectangle>,
}

/// JPEG bytes in, sorted rectangles out: decode → (gray) → detect.
pub struct RecognizeImageUseCase {
    engine: DetectionEngine,
    options: RecognizeOptions,
}

impl RecognizeImageUseCase {
    pub fn new(engine: DetectionEngine, options: RecognizeOptions) -> Self {
        Self { engine, options }
    }

    pub fn engine(&self) -> &DetectionEngine {
        &self.engine
    }

    pub fn options(&self) -> RecognizeOptions {
        self.options
    }

    pub fn execute(&self, bytes: &[u8]) -> Result<Vec<Rectangle>, RecognizeError> {
        Ok(self.recognize(bytes)?.rects)
    }

    pub fn execute_file(&self, path: &Path) -> Result<Vec<Rectangle>, RecognizeError> {
        Ok(self.recognize_file(path)?.rects)
    }

    /// Like [`execute`](Self::execute), but also hands back the image that
    /// was scanned (grayscale when that option is set).
    pub fn recognize(&self, bytes: &[u8]) -> Result<Recognition, RecognizeError> {
        let mut image = if self.options.auto_orient {
            image_decoder::decode_oriented(bytes)?
        } else {
            image_decoder::decode(bytes)?
        };
        if self.options.grayscale {
            image = image.to_grayscale();
        }
        let rects = self.engine.detect(&image)?;
        Ok(Recognition { image, rects })
    }

    pub fn recognize_file(&self, path: &Path) -> Result<Recognition, RecognizeError> {
        let bytes = std::fs::read(path).map_err(|e| RecognizeError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.recognize(&bytes)
    }
}
