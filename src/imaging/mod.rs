//! Image processing — pure Rust decode and resize, libwebp encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | **Crop to aspect** | centered crop via `DynamicImage::crop_imm` |
//! | **Resize** | Lanczos3 via `DynamicImage::resize_exact` |
//! | **Encode → WEBP** | `webp` crate (lossy, quality 1–100) |
//!
//! The module is split into:
//! - **Crop**: Pure crop-box math plus the image-level wrapper (unit testable)
//! - **Parameters**: [`DerivativeSpec`] and friends describing one derivative
//! - **Renderer**: [`render`]/[`render_image`] executing a spec end to end

pub mod crop;
mod params;
pub mod renderer;

pub use crop::{crop_box, crop_to_aspect};
pub use params::{DerivativeSpec, Quality, ResizePolicy};
pub use renderer::{RenderError, decode, render, render_image};
