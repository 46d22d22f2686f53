//! Derivative rendering: decode, crop, resize, encode.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | **Crop** | [`crop_to_aspect`](super::crop::crop_to_aspect) |
//! | **Resize** | `DynamicImage::resize_exact` with `Lanczos3` |
//! | **Encode → WEBP** | `webp::Encoder` (libwebp, lossy) |
//!
//! [`render`] runs the whole pipeline from encoded source bytes.
//! [`render_image`] starts from an already-decoded image so callers producing
//! several derivatives from one source decode once and share the buffer; the
//! shared image is never mutated.

use super::crop::crop_to_aspect;
use super::params::{DerivativeSpec, Quality, ResizePolicy};
use image::DynamicImage;
use image::imageops::FilterType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to decode source image: {0}")]
    Decode(String),
    #[error("WEBP encode failed: {0}")]
    Encode(String),
}

/// Decode `bytes` and render one derivative according to `spec`.
///
/// The decoded buffer is scoped to this call and released on every exit
/// path. On failure nothing is produced — output is always a complete WEBP
/// buffer or an error.
pub fn render(bytes: &[u8], spec: &DerivativeSpec) -> Result<Vec<u8>, RenderError> {
    let img = decode(bytes)?;
    render_image(&img, spec)
}

/// Render one derivative from an already-decoded source image.
pub fn render_image(img: &DynamicImage, spec: &DerivativeSpec) -> Result<Vec<u8>, RenderError> {
    let cropped = match spec.crop_ratio {
        Some((w, h)) => crop_to_aspect(img, w, h),
        None => img.clone(),
    };

    let resized = match spec.resize {
        // Redundant with an exact-ratio crop, but enforces exact pixel dimensions.
        ResizePolicy::Exact(w, h) => cropped.resize_exact(w, h, FilterType::Lanczos3),
        ResizePolicy::MaxWidth(max_w) if cropped.width() > max_w => {
            let scale = max_w as f64 / cropped.width() as f64;
            let new_h = (cropped.height() as f64 * scale).round() as u32;
            cropped.resize_exact(max_w, new_h, FilterType::Lanczos3)
        }
        _ => cropped,
    };

    encode_webp(&resized, spec.quality)
}

/// Decode source bytes into a [`DynamicImage`].
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, RenderError> {
    image::load_from_memory(bytes).map_err(|e| RenderError::Decode(e.to_string()))
}

/// Encode as lossy WEBP at the given quality.
fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, RenderError> {
    // libwebp only accepts 8-bit RGB/RGBA buffers
    let converted;
    let img = match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
        _ => {
            converted = DynamicImage::ImageRgba8(img.to_rgba8());
            &converted
        }
    };
    let encoder = webp::Encoder::from_image(img).map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(encoder.encode(quality.value() as f32).to_vec())
}
