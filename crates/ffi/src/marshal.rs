//! Builds the caller-owned records. Every allocation here uses the C
//! allocator so callers may release it with plain `free()`.

use std::mem::size_of;
use std::os::raw::c_char;
use std::ptr;

use objrec_core::shared::rectangle::Rectangle;

use crate::error::BoundaryError;
use crate::records::{err_code, objrec, objrec_cls, objret};

const RECT_LEN: usize = 4;

/// Zeroed allocation for one record.
fn alloc_record<T>() -> *mut T {
    unsafe { libc::calloc(1, size_of::<T>()) as *mut T }
}

/// NUL-terminated copy of `message` with interior NULs dropped. Null if
/// the allocation fails.
pub(crate) fn c_string(message: &str) -> *const c_char {
    let bytes: Vec<u8> = message.bytes().filter(|&b| b != 0).collect();
    unsafe {
        let buf = libc::malloc(bytes.len() + 1) as *mut u8;
        if buf.is_null() {
            return ptr::null();
        }
        ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
        *buf.add(bytes.len()) = 0;
        buf as *const c_char
    }
}

pub(crate) fn checked_count(len: usize) -> Result<i32, BoundaryError> {
    i32::try_from(len).map_err(|_| BoundaryError::TooManyDetections(len))
}

/// Flattens rectangles into `len * 4` integers. Empty input gives a null
/// buffer rather than a zero-length allocation.
pub(crate) fn rect_buffer(rects: &[Rectangle]) -> Result<(*mut i64, i32), BoundaryError> {
    let count = checked_count(rects.len())?;
    if rects.is_empty() {
        return Ok((ptr::null_mut(), 0));
    }
    let values = rects.len() * RECT_LEN;
    unsafe {
        let buf = libc::malloc(values * size_of::<i64>()) as *mut i64;
        if buf.is_null() {
            return Err(BoundaryError::OutOfMemory);
        }
        let out = std::slice::from_raw_parts_mut(buf, values);
        for (dst, rect) in out.chunks_exact_mut(RECT_LEN).zip(rects) {
            dst.copy_from_slice(&rect.to_array());
        }
        Ok((buf, count))
    }
}

/// Handle record for `init`. On allocation failure the engine is released
/// and null is returned.
pub(crate) fn handle_record(result: Result<*mut objrec_cls, BoundaryError>) -> *mut objrec {
    let rec = alloc_record::<objrec>();
    if rec.is_null() {
        if let Ok(cls) = result {
            unsafe { drop(objrec_cls::into_internal(cls)) };
        }
        return ptr::null_mut();
    }
    let record = match result {
        Ok(cls) => objrec {
            cls,
            err_str: ptr::null(),
            err_code: err_code::ERR_NONE,
        },
        Err(e) => objrec {
            cls: ptr::null_mut(),
            err_str: c_string(&e.to_string()),
            err_code: e.code(),
        },
    };
    unsafe { rec.write(record) };
    rec
}

/// Result record for `recognize`.
pub(crate) fn result_record(result: Result<Vec<Rectangle>, BoundaryError>) -> *mut objret {
    let ret = alloc_record::<objret>();
    if ret.is_null() {
        return ptr::null_mut();
    }
    let record = match result.and_then(|rects| rect_buffer(&rects)) {
        Ok((rectangles, rect_count)) => objret {
            rectangles,
            rect_count,
            err_str: ptr::null(),
            err_code: err_code::ERR_NONE,
        },
        Err(e) => {
            log::warn!("objrec_recognize failed: {e}");
            objret {
                rectangles: ptr::null_mut(),
                rect_count: 0,
                err_str: c_string(&e.to_string()),
                err_code: e.code(),
            }
        }
    };
    unsafe { ret.write(record) };
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    unsafe fn read_and_free(s: *const c_char) -> String {
        let text = CStr::from_ptr(s).to_string_lossy().into_owned();
        libc::free(s as *mut libc::c_void);
        text
    }

    #[test]
    fn test_c_string_copies_message() {
        let s = c_string("failed to decode JPEG");
        assert_eq!(unsafe { read_and_free(s) }, "failed to decode JPEG");
    }

    #[test]
    fn test_c_string_drops_interior_nul() {
        let s = c_string("bad\0path");
        assert_eq!(unsafe { read_and_free(s) }, "badpath");
    }

    #[test]
    fn test_c_string_empty() {
        let s = c_string("");
        assert!(!s.is_null());
        assert_eq!(unsafe { read_and_free(s) }, "");
    }

    #[test]
    fn test_empty_rects_give_null_buffer() {
        let (buf, count) = rect_buffer(&[]).unwrap();
        assert!(buf.is_null());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_rect_buffer_layout() {
        let rects = [Rectangle::new(1, 2, 3, 4), Rectangle::new(-5, 6, 7, 8)];
        let (buf, count) = rect_buffer(&rects).unwrap();
        assert_eq!(count, 2);
        let values = unsafe { std::slice::from_raw_parts(buf, 8) }.to_vec();
        unsafe { libc::free(buf as *mut libc::c_void) };
        assert_eq!(values, vec![1, 2, 3, 4, -5, 6, 7, 8]);
    }

    #[test]
    fn test_count_overflow() {
        let too_many = i32::MAX as usize + 1;
        let err = checked_count(too_many).unwrap_err();
        assert!(matches!(err, BoundaryError::TooManyDetections(n) if n == too_many));
        assert_eq!(err.code(), err_code::UNKNOWN_ERROR);
        assert_eq!(checked_count(3).unwrap(), 3);
    }

    #[test]
    fn test_error_record() {
        let ret = result_record(Err(BoundaryError::NullArgument("recognizer is not initialized")));
        unsafe {
            assert!((*ret).rectangles.is_null());
            assert_eq!((*ret).rect_count, 0);
            assert_eq!((*ret).err_code, err_code::UNKNOWN_ERROR);
            assert_eq!(read_and_free((*ret).err_str), "recognizer is not initialized");
            libc::free(ret as *mut libc::c_void);
        }
    }

    #[test]
    fn test_handle_record_error() {
        let rec = handle_record(Err(BoundaryError::InvalidPath));
        unsafe {
            assert!((*rec).cls.is_null());
            assert_eq!((*rec).err_code, err_code::UNKNOWN_ERROR);
            assert_eq!(read_and_free((*rec).err_str), "model path is not valid UTF-8");
            libc::free(rec as *mut libc::c_void);
        }
    }
}
