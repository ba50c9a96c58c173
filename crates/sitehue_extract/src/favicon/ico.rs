//! ICO container handling: pick the entry closest to the target size and
//! re-encode it as a PNG of exactly that size.

use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat};

use crate::error::DecodeError;

const HEADER_LEN: usize = 6;
const ENTRY_LEN: usize = 16;
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IconEntry {
    width: u32,
    height: u32,
    bits_per_pixel: u16,
    size: usize,
    offset: usize,
    /// Raw 16 byte directory record
    record: [u8; ENTRY_LEN],
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn parse_directory(bytes: &[u8]) -> Result<Vec<IconEntry>, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Ico("truncated header".to_string()));
    }
    if read_u16(bytes, 0) != 0 || read_u16(bytes, 2) != 1 {
        return Err(DecodeError::Ico("not an icon resource".to_string()));
    }
    let count = read_u16(bytes, 4) as usize;
    if count == 0 {
        return Err(DecodeError::Ico("no images".to_string()));
    }

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let start = HEADER_LEN + i * ENTRY_LEN;
        let Some(raw) = bytes.get(start..start + ENTRY_LEN) else {
            return Err(DecodeError::Ico("truncated directory".to_string()));
        };
        let mut record = [0u8; ENTRY_LEN];
        record.copy_from_slice(raw);
        // A stored dimension of 0 means 256.
        let dim = |b: u8| if b == 0 { 256 } else { u32::from(b) };
        entries.push(IconEntry {
            width: dim(raw[0]),
            height: dim(raw[1]),
            bits_per_pixel: read_u16(raw, 6),
            size: read_u32(raw, 8) as usize,
            offset: read_u32(raw, 12) as usize,
            record,
        });
    }
    Ok(entries)
}

/// Closest edge length to `target` wins; ties go to the deeper color entry.
fn best_entry(entries: &[IconEntry], target: u32) -> Option<&IconEntry> {
    entries.iter().min_by_key(|e| {
        let edge = e.width.max(e.height);
        (edge.abs_diff(target), std::cmp::Reverse(e.bits_per_pixel))
    })
}

fn decode_entry(bytes: &[u8], entry: &IconEntry) -> Result<image::DynamicImage, DecodeError> {
    let payload = entry
        .offset
        .checked_add(entry.size)
        .and_then(|end| bytes.get(entry.offset..end))
        .ok_or_else(|| DecodeError::Ico("image data out of bounds".to_string()))?;

    if payload.starts_with(PNG_SIGNATURE) {
        return Ok(image::load_from_memory_with_format(payload, ImageFormat::Png)?);
    }

    // Wrap the BMP payload in a single entry icon so the ICO decoder can read it.
    let mut single = Vec::with_capacity(HEADER_LEN + ENTRY_LEN + payload.len());
    single.extend_from_slice(&[0, 0, 1, 0, 1, 0]);
    single.extend_from_slice(&entry.record[..12]);
    single.extend_from_slice(&((HEADER_LEN + ENTRY_LEN) as u32).to_le_bytes());
    single.extend_from_slice(payload);
    Ok(image::load_from_memory_with_format(&single, ImageFormat::Ico)?)
}

/// Convert an ICO buffer to PNG bytes at `size`×`size`.
pub fn ico_to_png(bytes: &[u8], size: u32) -> Result<Vec<u8>, DecodeError> {
    let entries = parse_directory(bytes)?;
    let entry = best_entry(&entries, size)
        .ok_or_else(|| DecodeError::Ico("no usable image".to_string()))?;
    tracing::debug!(
        width = entry.width,
        height = entry.height,
        bpp = entry.bits_per_pixel,
        "Selected icon entry"
    );

    let img = decode_entry(bytes, entry)?.resize_exact(size, size, FilterType::Lanczos3);

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png_bytes(edge: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(edge, edge, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// Icon file whose entries are PNG payloads.
    fn ico_with_pngs(images: &[(u32, Vec<u8>)]) -> Vec<u8> {
        let mut out = vec![0, 0, 1, 0];
        out.extend_from_slice(&(images.len() as u16).to_le_bytes());
        let mut offset = HEADER_LEN + images.len() * ENTRY_LEN;
        for (edge, data) in images {
            let stored = if *edge >= 256 { 0 } else { *edge as u8 };
            out.extend_from_slice(&[stored, stored, 0, 0]);
            out.extend_from_slice(&1u16.to_le_bytes());
            out.extend_from_slice(&32u16.to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            offset += data.len();
        }
        for (_, data) in images {
            out.extend_from_slice(data);
        }
        out
    }

    #[test]
    fn test_picks_closest_entry() {
        let ico = ico_with_pngs(&[
            (16, png_bytes(16, [255, 0, 0, 255])),
            (48, png_bytes(48, [0, 0, 255, 255])),
            (256, png_bytes(256, [0, 255, 0, 255])),
        ]);
        let png = ico_to_png(&ico, 32).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (32, 32));
        // 16 and 48 are equally close; 16 comes first at equal depth.
        let [r, g, b, _] = img.get_pixel(16, 16).0;
        assert!(r > 250 && g < 5 && b < 5, "got {r},{g},{b}");
    }

    #[test]
    fn test_stored_zero_means_256() {
        let ico = ico_with_pngs(&[(256, png_bytes(4, [1, 2, 3, 255]))]);
        let entries = parse_directory(&ico).unwrap();
        assert_eq!(entries[0].width, 256);
    }

    #[test]
    fn test_rejects_non_icon() {
        assert!(matches!(ico_to_png(b"GIF89a....", 32), Err(DecodeError::Ico(_))));
        assert!(matches!(ico_to_png(&[0, 0, 1], 32), Err(DecodeError::Ico(_))));
    }

    #[test]
    fn test_out_of_bounds_payload() {
        let mut ico = ico_with_pngs(&[(16, png_bytes(16, [0, 0, 0, 255]))]);
        ico.truncate(ico.len() - 10);
        assert!(matches!(ico_to_png(&ico, 32), Err(DecodeError::Ico(_))));
    }
}
