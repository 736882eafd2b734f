use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;

use super::asset::AssetError;

pub const JPEG_QUALITY: u8 = 70;

/// Decode `data`, flatten it to 24-bit RGB, shrink it to fit a `max_dim` square and
/// re-encode it as JPEG.
///
/// Images already inside the box keep their dimensions; nothing is upscaled.
/// CPU-bound: call from a blocking task.
pub fn to_bounded_jpeg(data: &[u8], max_dim: u32) -> Result<Vec<u8>, AssetError> {
    let decoded =
        image::load_from_memory(data).map_err(|e| AssetError::Decode(e.to_string()))?;

    let bounded = shrink_to_fit(decoded, max_dim);
    let rgb = bounded.to_rgb8();

    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .map_err(|e| AssetError::Encode(e.to_string()))?;
    Ok(out)
}

fn shrink_to_fit(image: DynamicImage, max_dim: u32) -> DynamicImage {
    if image.width() <= max_dim && image.height() <= max_dim {
        return image;
    }
    image.thumbnail(max_dim, max_dim)
}
