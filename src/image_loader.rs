//! # Image Probing
//!
//! The editor stores inserted images as opaque data URIs and never decodes
//! pixels itself. What it does need is the intrinsic pixel size, so a newly
//! inserted image can get a sensible default block size instead of an
//! arbitrary square. This module decodes the base64 payload, sniffs the
//! dimensions from the container header, and scales them into mm against
//! the writing area.

use std::io::Cursor;

use base64::Engine;

use crate::error::FoliaError;
use crate::layout::WritingArea;
use crate::model::{BlockDefaults, FloatingBlock, ImageElement, MIN_BLOCK_MM};
use crate::units::px_to_mm;

/// Intrinsic pixel dimensions of an image source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProbe {
    pub width_px: u32,
    pub height_px: u32,
}

/// Read the intrinsic dimensions of an image source without decoding pixels.
///
/// Supported `src` formats:
/// - `data:image/...;base64,...` — data URI
/// - Raw base64-encoded image data
pub fn probe_image(src: &str) -> Result<ImageProbe, FoliaError> {
    let bytes = read_source_bytes(src)?;
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FoliaError::Image(format!("Format detection error: {e}")))?;
    let (width_px, height_px) = reader
        .into_dimensions()
        .map_err(|e| FoliaError::Image(format!("Failed to read image dimensions: {e}")))?;
    Ok(ImageProbe {
        width_px,
        height_px,
    })
}

fn read_source_bytes(src: &str) -> Result<Vec<u8>, FoliaError> {
    if src.starts_with("data:image/") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| FoliaError::Image("Invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma_pos + 1..]);
    }
    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, FoliaError> {
    base64::engine::general_purpose::STANDARD
        .decode(input)
        .map_err(|e| FoliaError::Image(format!("Base64 decode error: {e}")))
}

/// Default block size (mm) for an inserted image: the intrinsic size at
/// screen resolution, scaled down to fit half the writing-area width and a
/// height cap, floored at the minimum block size. Without a usable probe
/// the defaults' square is used.
pub fn default_image_size(
    probe: Option<ImageProbe>,
    area: &WritingArea,
    defaults: &BlockDefaults,
) -> (f64, f64) {
    let Some(probe) = probe else {
        return (defaults.width, defaults.height);
    };
    if probe.width_px == 0 || probe.height_px == 0 {
        return (defaults.width, defaults.height);
    }
    let mut width = px_to_mm(probe.width_px as f64);
    let mut height = px_to_mm(probe.height_px as f64);

    let max_width = (area.width / 2.0).max(MIN_BLOCK_MM);
    let max_height = (area.height / 2.0).max(MIN_BLOCK_MM);
    let scale = (max_width / width).min(max_height / height).min(1.0);
    width *= scale;
    height *= scale;

    (width.max(MIN_BLOCK_MM), height.max(MIN_BLOCK_MM))
}

/// Build a new image entity for insertion. The id is left empty; the
/// collection assigns it (and staggers the top) on add. A url that cannot
/// be probed still yields a valid block at the default size.
pub fn image_from_url(url: &str, area: &WritingArea) -> ImageElement {
    let defaults = BlockDefaults::image();
    let (width, height) = default_image_size(probe_image(url).ok(), area, &defaults);
    ImageElement {
        block: FloatingBlock {
            id: String::new(),
            side: defaults.side,
            top: defaults.top,
            width,
            height,
        },
        url: url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaperConfig;

    // 1x1 transparent PNG.
    const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn b5_area() -> WritingArea {
        WritingArea::compute(&PaperConfig::b5(), 8.0, false)
    }

    #[test]
    fn test_probe_data_uri() {
        let probe = probe_image(TINY_PNG).unwrap();
        assert_eq!(probe.width_px, 1);
        assert_eq!(probe.height_px, 1);
    }

    #[test]
    fn test_probe_rejects_garbage() {
        assert!(probe_image("data:image/png;base64,!!!").is_err());
        assert!(probe_image("data:image/png").is_err());
        assert!(probe_image("AAAA").is_err());
    }

    #[test]
    fn test_default_size_scales_down_large_images() {
        let area = b5_area();
        let probe = ImageProbe {
            width_px: 4000,
            height_px: 2000,
        };
        let (w, h) = default_image_size(Some(probe), &area, &BlockDefaults::image());
        assert!(w <= area.width / 2.0 + 1e-9);
        assert!(h <= area.height / 2.0 + 1e-9);
        // Aspect ratio survives the scaling.
        assert!((w / h - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_size_floors_tiny_images() {
        let area = b5_area();
        let probe = ImageProbe {
            width_px: 4,
            height_px: 4,
        };
        let (w, h) = default_image_size(Some(probe), &area, &BlockDefaults::image());
        assert_eq!(w, MIN_BLOCK_MM);
        assert_eq!(h, MIN_BLOCK_MM);
    }

    #[test]
    fn test_default_size_without_probe_uses_defaults() {
        let (w, h) = default_image_size(None, &b5_area(), &BlockDefaults::image());
        assert_eq!((w, h), (50.0, 50.0));
    }

    #[test]
    fn test_image_from_unprobeable_url_still_valid() {
        let img = image_from_url("data:image/png;base64,notbase64!!", &b5_area());
        assert_eq!(img.block.width, 50.0);
        assert_eq!(img.block.height, 50.0);
        assert!(img.block.id.is_empty());
    }
}
