use thiserror::Error;

use crate::shared::error_kind::ErrorKind;
use crate::shared::pixel_matrix::PixelMatrix;
use crate::shared::rectangle::Rectangle;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("cannot scan an image with zero width or height")]
    EmptyImage,
    #[error("non-finite window score at pyramid level {level}")]
    NonFiniteScore { level: usize },
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Unknown
    }
}

/// A scored candidate region. The score orders detections during
/// suppression and never leaves the detection layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub rect: Rectangle,
    pub score: f64,
}

/// Domain interface for sliding-window object scanning.
///
/// Implementations may keep scratch state between calls and are not
/// reentrant, hence `&mut self`. Callers sharing a scanner must serialize
/// access (see `DetectionEngine`).
pub trait ObjectScanner: Send {
    fn scan(&mut self, image: &PixelMatrix) -> Result<Vec<Detection>, ScanError>;
}
