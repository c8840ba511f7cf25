//! PNG encoding for RGBA pixmaps.
//!
//! Straight RGBA PNG (color type 6) with per-scanline Sub filtering,
//! which compresses the smooth gradients of map backgrounds well.
//! Scanline filtering runs in parallel; zlib compression is sequential.

use rayon::prelude::*;
use std::io::Write;

/// Encode RGBA pixel data (4 bytes per pixel) as a PNG file image.
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, String> {
    if pixels.len() != width * height * 4 {
        return Err(format!(
            "pixel buffer is {} bytes, expected {} for {}x{}",
            pixels.len(),
            width * height * 4,
            width,
            height
        ));
    }

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    // IHDR chunk
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(6); // color type (RGBA)
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    // IDAT chunk (image data)
    let idat_data = deflate_idat(pixels, width, height)
        .map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk: length, type, data, CRC.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Sub-filter every scanline, then deflate.
fn deflate_idat(
    pixels: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let stride = width * 4;

    // Each filtered row is: filter byte (1 = Sub) + stride bytes where
    // each byte has the previous pixel's byte subtracted.
    let rows: Vec<Vec<u8>> = (0..height)
        .into_par_iter()
        .map(|y| {
            let row = &pixels[y * stride..(y + 1) * stride];
            let mut out = Vec::with_capacity(1 + stride);
            out.push(1); // filter type: Sub
            out.extend_from_slice(&row[..4.min(stride)]);
            for i in 4..stride {
                out.push(row[i].wrapping_sub(row[i - 4]));
            }
            out
        })
        .collect();

    let mut encoder = flate2::write::ZlibEncoder::new(
        Vec::with_capacity(pixels.len() / 4),
        flate2::Compression::fast(),
    );
    for row in &rows {
        encoder.write_all(row)?;
    }
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_and_ihdr() {
        let pixels = vec![0u8; 4 * 4 * 4];
        let png = encode_rgba(&pixels, 4, 4).unwrap();

        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        // IHDR starts at byte 8: 4-byte length, then type
        assert_eq!(&png[12..16], b"IHDR");
        // width/height big-endian
        assert_eq!(&png[16..20], &4u32.to_be_bytes());
        assert_eq!(&png[20..24], &4u32.to_be_bytes());
        // bit depth 8, color type 6
        assert_eq!(png[24], 8);
        assert_eq!(png[25], 6);
    }

    #[test]
    fn test_ends_with_iend() {
        let pixels = vec![128u8; 2 * 2 * 4];
        let png = encode_rgba(&pixels, 2, 2).unwrap();
        let tail = &png[png.len() - 8..png.len() - 4];
        assert_eq!(tail, b"IEND");
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let pixels = vec![0u8; 10];
        assert!(encode_rgba(&pixels, 4, 4).is_err());
    }

    #[test]
    fn test_decodes_back_with_image_crate() {
        // Gradient image exercises the Sub filter
        let (w, h) = (32usize, 16usize);
        let mut pixels = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                pixels.extend_from_slice(&[(x * 8) as u8, (y * 16) as u8, 77, 255]);
            }
        }
        let png = encode_rgba(&pixels, w, h).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.width(), w as u32);
        assert_eq!(decoded.height(), h as u32);
        assert_eq!(decoded.get_pixel(3, 2).0, [24, 32, 77, 255]);
    }
}
