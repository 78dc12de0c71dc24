//! Upload preprocessing for editable images.
//!
//! The document store has a hard per-document size ceiling, so images are
//! downscaled and re-encoded before any write is attempted: width capped
//! with proportional height, then JPEG quality stepped down until the
//! payload fits. An image that cannot be brought under the limit is
//! refused here, client-visible, with no write.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

/// Uploaded images are never wider than this; height scales with aspect.
pub const MAX_WIDTH: u32 = 800;

/// JPEG quality steps tried in order until the size bound is met.
pub const QUALITY_STEPS: [u8; 3] = [80, 70, 50];

#[derive(Error, Debug)]
pub enum ImagePrepError {
    #[error("could not decode image: {0}")]
    Decode(image::ImageError),

    #[error("could not encode image: {0}")]
    Encode(image::ImageError),

    #[error("image still exceeds {limit} bytes after maximum compression")]
    TooLarge { limit: usize },
}

/// Downscale and re-encode an uploaded image to fit under `limit` bytes.
pub fn prepare_image(bytes: &[u8], limit: usize) -> Result<Vec<u8>, ImagePrepError> {
    let decoded = image::load_from_memory(bytes).map_err(ImagePrepError::Decode)?;
    let scaled = scale_to_width(decoded, MAX_WIDTH);
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(scaled.to_rgb8());

    for quality in QUALITY_STEPS {
        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), quality);
        rgb.write_with_encoder(encoder)
            .map_err(ImagePrepError::Encode)?;
        if out.len() <= limit {
            return Ok(out);
        }
    }
    Err(ImagePrepError::TooLarge { limit })
}

fn scale_to_width(image: DynamicImage, max_width: u32) -> DynamicImage {
    if image.width() <= max_width {
        return image;
    }
    let height =
        ((image.height() as u64 * max_width as u64) / image.width() as u64).max(1) as u32;
    image.resize_exact(max_width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32, noisy: bool) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            if noisy {
                // Deterministic noise so JPEG cannot compress it away.
                let v = (x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17))) as u8;
                image::Rgb([v, v.wrapping_mul(7), v.wrapping_mul(13)])
            } else {
                image::Rgb([200, 180, 140])
            }
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn small_image_encodes_under_limit() {
        let bytes = png_bytes(64, 48, false);
        let out = prepare_image(&bytes, 512 * 1024).unwrap();
        // JPEG magic.
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn wide_image_is_capped_proportionally() {
        let bytes = png_bytes(1600, 400, false);
        let out = prepare_image(&bytes, 512 * 1024).unwrap();
        let reread = image::load_from_memory(&out).unwrap();
        assert_eq!(reread.width(), MAX_WIDTH);
        assert_eq!(reread.height(), 200);
    }

    #[test]
    fn oversized_after_all_steps_is_refused() {
        let bytes = png_bytes(640, 480, true);
        let err = prepare_image(&bytes, 64).unwrap_err();
        assert!(matches!(err, ImagePrepError::TooLarge { limit: 64 }));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = prepare_image(b"definitely not an image", 1024).unwrap_err();
        assert!(matches!(err, ImagePrepError::Decode(_)));
    }
}
