use std::os::raw::c_char;

use objrec_core::pipeline::recognize_use_case::RecognizeImageUseCase;
use objrec_core::shared::error_kind::ErrorKind;

/// Error codes carried in every record. Zero means success, so a
/// zero-initialized record reads as "no error".
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum err_code {
    ERR_NONE = 0,
    IMAGE_LOAD_ERROR = 1,
    SERIALIZATION_ERROR = 2,
    UNKNOWN_ERROR = 3,
}

impl From<ErrorKind> for err_code {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::ImageLoad => err_code::IMAGE_LOAD_ERROR,
            ErrorKind::Serialization => err_code::SERIALIZATION_ERROR,
            ErrorKind::Unknown => err_code::UNKNOWN_ERROR,
        }
    }
}

/// Opaque recognizer handle.
#[repr(C)]
pub struct objrec_cls {
    _private: [u8; 0],
}

impl objrec_cls {
    pub(crate) fn from_internal(internal: Box<RecognizeImageUseCase>) -> *mut Self {
        Box::into_raw(internal) as *mut Self
    }

    /// # Safety
    /// Pointer must have come from `from_internal` and not been released.
    pub(crate) unsafe fn into_internal(ptr: *mut Self) -> Box<RecognizeImageUseCase> {
        Box::from_raw(ptr as *mut RecognizeImageUseCase)
    }

    /// # Safety
    /// Pointer must have come from `from_internal` and outlive `'a`.
    pub(crate) unsafe fn as_internal<'a>(ptr: *const Self) -> &'a RecognizeImageUseCase {
        &*(ptr as *const RecognizeImageUseCase)
    }
}

/// Returned by `objrec_init`. `cls` is null whenever `err_code` is not
/// `ERR_NONE`.
#[repr(C)]
#[derive(Debug)]
pub struct objrec {
    pub cls: *mut objrec_cls,
    pub err_str: *const c_char,
    pub err_code: err_code,
}

/// Returned by `objrec_recognize`. `rectangles` holds `rect_count`
/// quadruples of `(left, top, right, bottom)`, or is null when there are
/// none.
#[repr(C)]
#[derive(Debug)]
pub struct objret {
    pub rectangles: *mut i64,
    pub rect_count: i32,
    pub err_str: *const c_char,
    pub err_code: err_code,
}
