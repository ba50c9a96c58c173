//! Rasterize SVG favicons, which the direct decoder cannot read, into PNG.

use super::mime;
use crate::error::DecodeError;

/// Largest edge an SVG favicon is rasterized at.
const SVG_RASTER_EDGE: f32 = 64.0;

/// Convert an SVG favicon, detected by extension or content, to PNG.
/// Raster formats are left to the direct decoder.
pub fn to_png(bytes: &[u8], ext: &str) -> Result<Vec<u8>, DecodeError> {
    if ext == ".svg" || mime::sniff_mime(bytes) == mime::SVG_MIME {
        return rasterize_svg(bytes);
    }
    Err(DecodeError::Unsupported(ext.to_string()))
}

pub fn rasterize_svg(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).map_err(|e| DecodeError::Svg(e.to_string()))?;

    let size = tree.size();
    let scale = SVG_RASTER_EDGE / size.width().max(size.height()).max(1.0);
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| DecodeError::Svg(format!("cannot allocate {width}x{height} pixmap")))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    pixmap
        .encode_png()
        .map_err(|e| DecodeError::Svg(e.to_string()))
}
