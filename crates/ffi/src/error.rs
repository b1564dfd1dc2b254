use objrec_core::detection::infrastructure::detector_model::ModelError;
use objrec_core::pipeline::recognize_use_case::RecognizeError;
use thiserror::Error;

use crate::records::err_code;

/// Everything that can go wrong in a boundary call.
#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("{0}")]
    NullArgument(&'static str),
    #[error("model path is not valid UTF-8")]
    InvalidPath,
    #[error("panic: {0}")]
    Panic(String),
    #[error("{0} detections do not fit in a 32-bit count")]
    TooManyDetections(usize),
    #[error("out of memory")]
    OutOfMemory,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Recognize(#[from] RecognizeError),
}

impl BoundaryError {
    pub fn code(&self) -> err_code {
        match self {
            BoundaryError::Model(e) => e.kind().into(),
            BoundaryError::Recognize(e) => e.kind().into(),
            _ => err_code::UNKNOWN_ERROR,
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        BoundaryError::Panic(message)
    }
}
