use image::{imageops, DynamicImage};
use sitehue_core::Rgb;

use crate::error::DecodeError;

pub const MAX_COLORS: usize = 5;
const SAMPLE_EDGE: u32 = 64;
/// Pixels at or below this alpha are treated as background.
const MIN_ALPHA: u8 = 125;

#[derive(Default, Clone, Copy)]
struct Bucket {
    count: u32,
    r: u64,
    g: u64,
    b: u64,
}

impl Bucket {
    fn mean(&self) -> Rgb {
        let n = u64::from(self.count.max(1));
        Rgb::new((self.r / n) as u8, (self.g / n) as u8, (self.b / n) as u8)
    }
}

/// Decode an image buffer and return its dominant colors as hex.
pub fn dominant_colors_from_bytes(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    let img = image::load_from_memory(bytes)?;
    Ok(dominant_colors(&img))
}

/// Up to [`MAX_COLORS`] colors ordered by pixel population.
///
/// Pixels are quantized into 5-bit buckets per channel; each bucket reports
/// the mean of its member pixels.
pub fn dominant_colors(img: &DynamicImage) -> Vec<String> {
    let mut rgba = img.to_rgba8();

    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }
    if w > SAMPLE_EDGE || h > SAMPLE_EDGE {
        let scale = (SAMPLE_EDGE as f32 / w as f32).min(SAMPLE_EDGE as f32 / h as f32);
        let new_w = ((w as f32) * scale).round().max(1.0) as u32;
        let new_h = ((h as f32) * scale).round().max(1.0) as u32;
        rgba = imageops::resize(&rgba, new_w, new_h, imageops::FilterType::Triangle);
    }

    let mut buckets = vec![Bucket::default(); 32 * 32 * 32];
    for p in rgba.pixels() {
        let [r, g, b, a] = p.0;
        if a <= MIN_ALPHA {
            continue;
        }
        let idx = ((r >> 3) as usize) << 10 | ((g >> 3) as usize) << 5 | (b >> 3) as usize;
        let bucket = &mut buckets[idx];
        bucket.count += 1;
        bucket.r += u64::from(r);
        bucket.g += u64::from(g);
        bucket.b += u64::from(b);
    }

    let mut populated: Vec<Bucket> = buckets.into_iter().filter(|b| b.count > 0).collect();
    populated.sort_by(|a, b| b.count.cmp(&a.count));
    populated
        .iter()
        .take(MAX_COLORS)
        .map(|bucket| bucket.mean().to_hex())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn image_with(pixels: &[(Rgba<u8>, u32)]) -> DynamicImage {
        let total: u32 = pixels.iter().map(|(_, n)| n).sum();
        let mut img = RgbaImage::new(total, 1);
        let mut x = 0;
        for (color, n) in pixels {
            for _ in 0..*n {
                img.put_pixel(x, 0, *color);
                x += 1;
            }
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_ordered_by_population() {
        let img = image_with(&[
            (Rgba([0, 0, 255, 255]), 3),
            (Rgba([255, 0, 0, 255]), 10),
            (Rgba([0, 255, 0, 255]), 6),
        ]);
        assert_eq!(dominant_colors(&img), vec!["#ff0000", "#00ff00", "#0000ff"]);
    }

    #[test]
    fn test_transparent_pixels_ignored() {
        let img = image_with(&[(Rgba([255, 255, 255, 0]), 50), (Rgba([16, 32, 48, 255]), 2)]);
        assert_eq!(dominant_colors(&img), vec!["#102030"]);
    }

    #[test]
    fn test_capped_at_five() {
        let pixels: Vec<(Rgba<u8>, u32)> = (0..8u8).map(|i| (Rgba([i * 30, 0, 0, 255]), 1)).collect();
        assert_eq!(dominant_colors(&image_with(&pixels)).len(), MAX_COLORS);
    }

    #[test]
    fn test_bucket_mean() {
        let img = image_with(&[(Rgba([10, 10, 10, 255]), 1), (Rgba([12, 12, 12, 255]), 1)]);
        assert_eq!(dominant_colors(&img), vec!["#0b0b0b"]);
    }

    #[test]
    fn test_garbage_bytes() {
        assert!(dominant_colors_from_bytes(b"not an image").is_err());
    }
}
