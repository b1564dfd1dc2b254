//! Exported entry points.
//!
//! Ownership:
//!
//! * `objrec_init` returns a handle record; release it with `objrec_free`.
//!   Its `err_str`, if any, is released separately with
//!   `objrec_string_free` (or `free`).
//! * `objrec_recognize` returns a result record; release it with
//!   `objret_free`, which also releases its rectangles and message.
//!
//! Either function returns null only when the record itself cannot be
//! allocated.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::ptr;

use objrec_core::detection::detection_engine::DetectionEngine;
use objrec_core::pipeline::recognize_use_case::{RecognizeImageUseCase, RecognizeOptions};
use objrec_core::shared::rectangle::Rectangle;

use crate::error::BoundaryError;
use crate::marshal;
use crate::records::{objrec, objrec_cls, objret};

/// Loads the detector model at `model_path` and builds a recognizer.
///
/// Missing, malformed or incompatible model files give
/// `SERIALIZATION_ERROR`; a null or non-UTF-8 path gives `UNKNOWN_ERROR`.
/// In both cases `cls` is null.
///
/// # Safety
/// `model_path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn objrec_init(model_path: *const c_char) -> *mut objrec {
    let result = catch_unwind(AssertUnwindSafe(|| load_recognizer(model_path)))
        .unwrap_or_else(|payload| Err(BoundaryError::from_panic(payload)));
    if let Err(e) = &result {
        log::warn!("objrec_init failed: {e}");
    }
    marshal::handle_record(result)
}

unsafe fn load_recognizer(model_path: *const c_char) -> Result<*mut objrec_cls, BoundaryError> {
    if model_path.is_null() {
        return Err(BoundaryError::NullArgument("model path is null"));
    }
    let path = CStr::from_ptr(model_path)
        .to_str()
        .map_err(|_| BoundaryError::InvalidPath)?;
    let engine = DetectionEngine::from_model_file(Path::new(path))?;
    let use_case = RecognizeImageUseCase::new(engine, RecognizeOptions::default());
    Ok(objrec_cls::from_internal(Box::new(use_case)))
}

/// Decodes `len` bytes of JPEG at `img_data` and runs detection.
///
/// Rectangles come back sorted by `(left, top, right, bottom)`. A null
/// `img_data` or non-positive `len` is treated as an empty image
/// (`IMAGE_LOAD_ERROR`). A null `rec`, or one whose `cls` is null, gives
/// `UNKNOWN_ERROR`. Safe to call from several threads on one handle.
///
/// # Safety
/// `rec` must be null or a live record from `objrec_init`; `img_data` must
/// be null or point to at least `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn objrec_recognize(
    rec: *mut objrec,
    img_data: *const u8,
    len: c_int,
) -> *mut objret {
    let result = catch_unwind(AssertUnwindSafe(|| recognize(rec, img_data, len)))
        .unwrap_or_else(|payload| Err(BoundaryError::from_panic(payload)));
    marshal::result_record(result)
}

unsafe fn recognize(
    rec: *const objrec,
    img_data: *const u8,
    len: c_int,
) -> Result<Vec<Rectangle>, BoundaryError> {
    if rec.is_null() || (*rec).cls.is_null() {
        return Err(BoundaryError::NullArgument("recognizer is not initialized"));
    }
    let use_case = objrec_cls::as_internal((*rec).cls);
    let bytes: &[u8] = if img_data.is_null() || len <= 0 {
        &[]
    } else {
        std::slice::from_raw_parts(img_data, len as usize)
    };
    Ok(use_case.execute(bytes)?)
}

/// Releases the recognizer and the record. Does not release `err_str`.
///
/// # Safety
/// `rec` must be null or a record from `objrec_init` not yet freed.
#[no_mangle]
pub unsafe extern "C" fn objrec_free(rec: *mut objrec) {
    if rec.is_null() {
        return;
    }
    let cls = (*rec).cls;
    if !cls.is_null() {
        drop(objrec_cls::into_internal(cls));
        (*rec).cls = ptr::null_mut();
    }
    libc::free(rec as *mut c_void);
}

/// Releases a result record together with its rectangles and message.
///
/// # Safety
/// `ret` must be null or a record from `objrec_recognize` not yet freed.
#[no_mangle]
pub unsafe extern "C" fn objret_free(ret: *mut objret) {
    if ret.is_null() {
        return;
    }
    libc::free((*ret).rectangles as *mut c_void);
    libc::free((*ret).err_str as *mut c_void);
    libc::free(ret as *mut c_void);
}

/// Releases an `err_str` taken from either record.
///
/// # Safety
/// `s` must be null or a message string from this library not yet freed.
#[no_mangle]
pub unsafe extern "C" fn objrec_string_free(s: *const c_char) {
    if !s.is_null() {
        libc::free(s as *mut c_void);
    }
}
