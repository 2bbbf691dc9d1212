//! Combining model validity masks with foreground masks.

use depthmesh_core::{Grid, GrayImage};
use image::imageops::{self, FilterType};

/// Intersects a model's validity mask with an optional foreground mask.
#[derive(Debug, Clone, Copy)]
pub struct MaskCompositor {
    threshold: u8,
}

impl Default for MaskCompositor {
    fn default() -> Self {
        Self::new(128)
    }
}

impl MaskCompositor {
    /// Foreground pixels are those strictly above `threshold`.
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Returns `model_mask AND foreground`.
    ///
    /// The foreground mask is resized to the model grid with nearest-neighbour
    /// sampling first, so its edges stay binary. Without a foreground mask the
    /// model mask is returned unchanged.
    pub fn combine(&self, model_mask: &Grid<bool>, fg_mask: Option<&GrayImage>) -> Grid<bool> {
        let Some(fg_mask) = fg_mask else {
            return model_mask.clone();
        };

        let (width, height) = model_mask.dimensions();
        let resized;
        let fg = if fg_mask.dimensions() == (width, height) {
            fg_mask
        } else {
            log::debug!(
                "resizing foreground mask {:?} -> {}x{}",
                fg_mask.dimensions(),
                width,
                height
            );
            resized = imageops::resize(fg_mask, width, height, FilterType::Nearest);
            &resized
        };

        let threshold = self.threshold;
        Grid::from_fn(width, height, |row, col| {
            let valid = model_mask.get(row, col).copied().unwrap_or(false);
            valid && fg.get_pixel(col, row).0[0] > threshold
        })
    }
}

/// Renders a boolean mask as an 8-bit image (255 for true, 0 for false).
pub fn mask_to_image(mask: &Grid<bool>) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |col, row| {
        image::Luma([if mask.get(row, col).copied().unwrap_or(false) {
            255
        } else {
            0
        }])
    })
}
