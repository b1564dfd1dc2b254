use std::ffi::{CStr, CString};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma};
use ndarray::Array3;
use ::objrec::{err_code, objrec, objrec_recognize, objret, objret_free};
use objrec_core::detection::domain::overlap_tester::OverlapTester;
use objrec_core::detection::infrastructure::detector_model::DetectorModel;
use objrec_core::shared::constants::FHOG_FEATURES;

/// Single-level detector that fires on the strongest gradient patch in any
/// 32x32 neighborhood.
pub fn write_square_model(path: &Path) {
    DetectorModel::from_filter(Array3::from_elem((4, 4, FHOG_FEATURES), 1.0), 0.01)
        .with_max_pyramid_levels(1)
        .with_overlap(OverlapTester::new(0.0, 1.0))
        .save(path)
        .unwrap();
}

/// 320x160 black JPEG with a white 16x16 square at each corner given.
pub fn squares_jpeg(corners: &[(u32, u32)]) -> Vec<u8> {
    let mut img = GrayImage::new(320, 160);
    for &(cx, cy) in corners {
        for y in cy..cy + 16 {
            for x in cx..cx + 16 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
    }
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 100)
        .encode_image(&img)
        .unwrap();
    buf
}

pub fn c_path(path: &Path) -> CString {
    CString::new(path.to_str().unwrap()).unwrap()
}

#[derive(Debug, PartialEq)]
pub struct Outcome {
    pub rects: Vec<[i64; 4]>,
    pub code: err_code,
    pub message: Option<String>,
    pub null_rects: bool,
}

/// Runs `objrec_recognize`, copies the record out and releases it.
pub unsafe fn recognize(rec: *mut objrec, bytes: &[u8]) -> Outcome {
    let ret = objrec_recognize(rec, bytes.as_ptr(), bytes.len() as i32);
    assert!(!ret.is_null());
    let outcome = read_ret(ret);
    objret_free(ret);
    outcome
}

pub unsafe fn read_ret(ret: *const objret) -> Outcome {
    let r = &*ret;
    let rects = if r.rectangles.is_null() {
        Vec::new()
    } else {
        std::slice::from_raw_parts(r.rectangles, r.rect_count as usize * 4)
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect()
    };
    Outcome {
        rects,
        code: r.err_code,
        message: message(r.err_str),
        null_rects: r.rectangles.is_null(),
    }
}

pub unsafe fn message(s: *const std::os::raw::c_char) -> Option<String> {
    if s.is_null() {
        None
    } else {
        Some(CStr::from_ptr(s).to_string_lossy().into_owned())
    }
}
