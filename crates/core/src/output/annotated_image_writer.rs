use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::shared::pixel_matrix::PixelMatrix;
use crate::shared::rectangle::Rectangle;

const DEFAULT_COLOR: [u8; 3] = [255, 0, 0];
const DEFAULT_THICKNESS: u32 = 2;

/// Draws detection outlines onto a copy of an image and saves it.
///
/// The output format follows the path's extension.
pub struct AnnotatedImageWriter {
    color: Rgb<u8>,
    thickness: u32,
}

impl AnnotatedImageWriter {
    pub fn new() -> Self {
        Self {
            color: Rgb(DEFAULT_COLOR),
            thickness: DEFAULT_THICKNESS,
        }
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = Rgb(color);
        self
    }

    pub fn with_thickness(mut self, thickness: u32) -> Self {
        self.thickness = thickness.max(1);
        self
    }

    /// Outlines are drawn inward from each rectangle's edge; parts outside
    /// the image are clipped.
    pub fn annotate(&self, image: &PixelMatrix, rects: &[Rectangle]) -> RgbImage {
        let mut canvas = image.as_rgb_image().clone();
        // Edges further out than the outline thickness are never visible,
        // so clipping there keeps every coordinate inside i32.
        let margin = self.thickness as i64;
        let bounds = Rectangle::new(
            -margin,
            -margin,
            canvas.width() as i64 - 1 + margin,
            canvas.height() as i64 - 1 + margin,
        );
        for rect in rects.iter().map(|r| r.intersection(&bounds)) {
            for inset in 0..self.thickness as i64 {
                let width = rect.width() - 2 * inset;
                let height = rect.height() - 2 * inset;
                if width <= 0 || height <= 0 {
                    break;
                }
                let outline = Rect::at((rect.left + inset) as i32, (rect.top + inset) as i32)
                    .of_size(width as u32, height as u32);
                draw_hollow_rect_mut(&mut canvas, outline, self.color);
            }
        }
        canvas
    }

    pub fn write(
        &self,
        path: &Path,
        image: &PixelMatrix,
        rects: &[Rectangle],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.annotate(image, rects).save(path)?;
        Ok(())
    }
}

impl Default for AnnotatedImageWriter {
    fn default() -> Self {
        Self::new()
    }
}
