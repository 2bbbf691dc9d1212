//! Image preprocessing ahead of inference: downscaling, padding, background removal.

use std::fmt;
use std::str::FromStr;

use depthmesh_core::{DepthmeshError, GrayImage, OptionSet, OptionValue, Result, RgbImage};
use image::imageops::{self, FilterType};

/// Engines work best on inputs whose sides are multiples of this.
pub const PAD_DIVISOR: u32 = 64;

/// How far to downscale an image before inference (`resize_to` option).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResizeTarget {
    /// Keep the input as is, without padding.
    #[default]
    Original,
    /// Fit inside a `n x n` square, then pad.
    Max(u32),
}

impl ResizeTarget {
    /// Reads `resize_to`; a missing option means [`ResizeTarget::Original`].
    pub fn from_options(options: &OptionSet) -> Result<Self> {
        let invalid = |reason: String| DepthmeshError::InvalidOption {
            name: "resize_to".to_string(),
            reason,
        };
        match options.get("resize_to") {
            None => Ok(Self::Original),
            Some(OptionValue::Text(text)) => text.parse().map_err(invalid),
            Some(OptionValue::Int(n)) => u32::try_from(*n)
                .ok()
                .filter(|&n| n > 0)
                .map(Self::Max)
                .ok_or_else(|| invalid(format!("{n} is not a positive size"))),
            Some(other) => Err(invalid(format!("unexpected value '{other}'"))),
        }
    }
}

impl FromStr for ResizeTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("original") {
            return Ok(Self::Original);
        }
        match s.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(Self::Max(n)),
            _ => Err(format!("'{s}' is neither 'Original' nor a positive size")),
        }
    }
}

impl fmt::Display for ResizeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("Original"),
            Self::Max(n) => write!(f, "{n}"),
        }
    }
}

/// Applies `target` to `image`.
pub fn apply_resize(image: RgbImage, target: ResizeTarget) -> RgbImage {
    match target {
        ResizeTarget::Original => image,
        ResizeTarget::Max(size) => resize_and_pad(&image, size, PAD_DIVISOR),
    }
}

/// Shrinks `image` to fit a `target_size` square and pads it with black.
///
/// The aspect ratio is kept and images are never enlarged. Padding grows
/// each side to the next multiple of `divisor` with the image centred.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]
pub fn resize_and_pad(image: &RgbImage, target_size: u32, divisor: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let target_size = target_size.max(1);
    let resized = if width > target_size || height > target_size {
        let scale = f64::from(target_size) / f64::from(width.max(height));
        let new_width = ((f64::from(width) * scale).round() as u32).clamp(1, target_size);
        let new_height = ((f64::from(height) * scale).round() as u32).clamp(1, target_size);
        imageops::resize(image, new_width, new_height, FilterType::Lanczos3)
    } else {
        image.clone()
    };

    let divisor = divisor.max(1);
    let padded_width = resized.width().div_ceil(divisor) * divisor;
    let padded_height = resized.height().div_ceil(divisor) * divisor;
    let mut padded = RgbImage::new(padded_width, padded_height);
    let x = (padded_width - resized.width()) / 2;
    let y = (padded_height - resized.height()) / 2;
    imageops::replace(&mut padded, &resized, i64::from(x), i64::from(y));

    log::info!(
        "resized {width}x{height} to {}x{}, padded to {padded_width}x{padded_height}",
        resized.width(),
        resized.height()
    );
    padded
}

/// A background-removed image and its foreground mask.
#[derive(Debug, Clone)]
pub struct Foreground {
    /// The input with background pixels cleared.
    pub image: RgbImage,
    /// 8-bit foreground mask, same size as `image`.
    pub mask: GrayImage,
}

/// A segmentation model separating the subject from the background.
pub trait ForegroundExtractor: Send {
    fn extract(&mut self, image: &RgbImage) -> Result<Foreground>;
}
