//! Centered crop-to-aspect-ratio.
//!
//! The crop box computation is a pure function on dimension pairs so the
//! branch logic is testable without touching pixels; [`crop_to_aspect`] is a
//! thin wrapper applying the box to a [`DynamicImage`].

use image::DynamicImage;

/// A crop region in pixel coordinates: (x, y, width, height).
pub type CropBox = (u32, u32, u32, u32);

/// Compute the centered crop box that reduces `current` to the aspect ratio
/// `target_w:target_h` without distortion.
///
/// If the image is proportionally wider than the target ratio, width is
/// cropped to `round(height * ratio)` and the full height is kept; otherwise
/// height is cropped to `round(width / ratio)` and the full width is kept.
/// Equal ratios fall into the height branch and keep the whole image.
///
/// # Examples
/// ```
/// # use atelier::imaging::crop_box;
/// // 1000x500 to 4:3: too wide, crop width to round(500 * 4/3) = 667
/// assert_eq!(crop_box((1000, 500), (4, 3)), (166, 0, 667, 500));
///
/// // 400x300 is already 4:3: nothing visible happens
/// assert_eq!(crop_box((400, 300), (4, 3)), (0, 0, 400, 300));
/// ```
pub fn crop_box(current: (u32, u32), target: (u32, u32)) -> CropBox {
    let (cur_w, cur_h) = current;
    let (target_w, target_h) = target;

    let target_ratio = target_w as f64 / target_h as f64;
    let current_ratio = cur_w as f64 / cur_h as f64;

    if current_ratio > target_ratio {
        // Too wide: crop width, keep full height, center horizontally.
        let new_w = ((cur_h as f64 * target_ratio).round() as u32).min(cur_w);
        let x = (cur_w - new_w) / 2;
        (x, 0, new_w, cur_h)
    } else {
        // Too tall (or exact): crop height, keep full width, center vertically.
        let new_h = ((cur_w as f64 / target_ratio).round() as u32).min(cur_h);
        let y = (cur_h - new_h) / 2;
        (0, y, cur_w, new_h)
    }
}

/// Crop an image to the target aspect ratio, centered.
///
/// Pure with respect to the caller: the source image is never mutated, so
/// several derivatives can be produced from one decoded buffer.
pub fn crop_to_aspect(img: &DynamicImage, target_w: u32, target_h: u32) -> DynamicImage {
    let (x, y, w, h) = crop_box((img.width(), img.height()), (target_w, target_h));
    img.crop_imm(x, y, w, h)
}
