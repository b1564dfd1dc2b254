use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use ndarray::ArrayView3;

/// A decoded image: contiguous RGB bytes in row-major order.
///
/// Produced fresh for every detection call and never retained past it.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelMatrix {
    pixels: RgbImage,
}

impl PixelMatrix {
    /// Wraps raw RGB bytes. Returns `None` when `data` is not exactly
    /// `width * height * 3` bytes long.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(|pixels| Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn data(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.pixels
    }

    /// `(height, width, 3)` view over the pixel bytes.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height() as usize, self.width() as usize, 3),
            self.pixels.as_raw(),
        )
        .expect("RgbImage length always matches its dimensions")
    }

    /// Triangle-filtered resample to the given size.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        Self {
            pixels: imageops::resize(&self.pixels, width, height, FilterType::Triangle),
        }
    }

    /// Luma conversion replicated back into three channels, so downstream
    /// stages still see an RGB matrix.
    pub fn to_grayscale(&self) -> Self {
        let luma = DynamicImage::ImageRgb8(self.pixels.clone()).into_luma8();
        Self {
            pixels: DynamicImage::ImageLuma8(luma).into_rgb8(),
        }
    }
}

impl From<RgbImage> for PixelMatrix {
    fn from(pixels: RgbImage) -> Self {
        Self { pixels }
    }
}

impl From<PixelMatrix> for RgbImage {
    fn from(matrix: PixelMatrix) -> Self {
        matrix.pixels
    }
}
