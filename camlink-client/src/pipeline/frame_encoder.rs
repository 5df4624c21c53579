use crate::error::EncodeError;
use crate::pipeline::StreamSettings;
use bytes::Bytes;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};

/// Turns a captured frame into the bytes sent over the wire.
///
/// Implementations are stateless and run on the blocking pool.
pub trait FrameEncoder: Send + Sync {
    fn encode(&self, image: &RgbImage, settings: &StreamSettings) -> Result<Bytes, EncodeError>;
}

/// Downscale to the stream bounds, then JPEG.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegFrameEncoder;

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&self, image: &RgbImage, settings: &StreamSettings) -> Result<Bytes, EncodeError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(EncodeError::EmptyFrame);
        }

        let (width, height) = fit_within(
            image.dimensions(),
            (settings.max_width, settings.max_height),
        );

        if (width, height) == image.dimensions() {
            encode_jpeg(image, settings.jpeg_quality)
        } else {
            let resized = imageops::resize(image, width, height, FilterType::Triangle);
            encode_jpeg(&resized, settings.jpeg_quality)
        }
    }
}

/// Largest size with the same aspect ratio that fits the bounds. Never upscales.
pub fn fit_within((width, height): (u32, u32), (max_w, max_h): (u32, u32)) -> (u32, u32) {
    if max_w == 0 || max_h == 0 || (width <= max_w && height <= max_h) {
        return (width, height);
    }

    let scale = f64::min(
        f64::from(max_w) / f64::from(width),
        f64::from(max_h) / f64::from(height),
    );
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;

    (w.min(max_w), h.min(max_h))
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Bytes, EncodeError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    image.write_with_encoder(encoder)?;
    Ok(Bytes::from(buf))
}
