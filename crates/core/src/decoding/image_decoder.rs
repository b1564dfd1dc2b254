use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ImageDecoder, ImageFormat};
use thiserror::Error;

use crate::shared::error_kind::ErrorKind;
use crate::shared::pixel_matrix::PixelMatrix;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty image buffer")]
    Empty,
    #[error("failed to decode JPEG: {0}")]
    Image(#[from] image::ImageError),
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ImageLoad
    }
}

/// Decodes an in-memory JPEG into an RGB pixel matrix at its natural size.
///
/// Grayscale and CMYK sources are expanded to RGB. Nothing partial is
/// returned on failure.
pub fn decode(bytes: &[u8]) -> Result<PixelMatrix, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
    Ok(PixelMatrix::from(image.into_rgb8()))
}

/// Like [`decode`], but rotates and flips the pixels as the EXIF
/// orientation tag says, so the result is upright. Files without the tag
/// come back unchanged.
pub fn decode_oriented(bytes: &[u8]) -> Result<PixelMatrix, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let mut decoder = JpegDecoder::new(Cursor::new(bytes))?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(PixelMatrix::from(image.into_rgb8()))
}
