use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageReader, codecs::jpeg::JpegEncoder};
use tracing::{debug, error};

use crate::domain::{
    common::entities::app_errors::CoreError, food_analysis::ports::ImageCodec,
};

pub const TRANSPORT_QUALITY: u8 = 80;
pub const STORAGE_START_QUALITY: u8 = 80;
pub const STORAGE_MIN_QUALITY: u8 = 10;
pub const STORAGE_QUALITY_STEP: u8 = 10;
pub const STORAGE_TARGET_BYTES: usize = 150 * 1024;

/// Decodes any supported photo format and re-encodes it as JPEG.
#[derive(Debug, Clone)]
pub struct JpegImageCodec {
    transport_quality: u8,
    storage_target_bytes: usize,
}

impl Default for JpegImageCodec {
    fn default() -> Self {
        Self {
            transport_quality: TRANSPORT_QUALITY,
            storage_target_bytes: STORAGE_TARGET_BYTES,
        }
    }
}

impl JpegImageCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage_target(mut self, bytes: usize) -> Self {
        self.storage_target_bytes = bytes;
        self
    }

    fn decode(image: &[u8]) -> Result<DynamicImage, CoreError> {
        ImageReader::new(Cursor::new(image))
            .with_guessed_format()
            .map_err(|e| {
                error!("Failed to read image: {}", e);
                CoreError::ImageEncoding(format!("failed to read image: {}", e))
            })?
            .decode()
            .map_err(|e| {
                error!("Failed to decode image: {}", e);
                CoreError::ImageEncoding(format!("failed to decode image: {}", e))
            })
    }

    fn encode(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoreError> {
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
        encoder
            .encode_image(&image.to_rgb8())
            .map_err(|e| {
                error!("Failed to encode JPEG at quality {}: {}", quality, e);
                CoreError::ImageEncoding(format!("failed to encode JPEG: {}", e))
            })?;

        Ok(bytes)
    }
}

impl ImageCodec for JpegImageCodec {
    fn encode_for_transport(&self, image: &[u8]) -> Result<String, CoreError> {
        let decoded = Self::decode(image)?;
        let jpeg = Self::encode(&decoded, self.transport_quality)?;

        debug!(input_bytes = image.len(), jpeg_bytes = jpeg.len(), "Encoded image for transport");
        Ok(general_purpose::STANDARD.encode(jpeg))
    }

    /// Lowers quality step by step until the JPEG fits the target; settles for
    /// the floor quality when nothing does.
    fn compress_for_storage(&self, image: &[u8]) -> Result<Vec<u8>, CoreError> {
        let decoded = Self::decode(image)?;
        let mut quality = STORAGE_START_QUALITY;

        loop {
            let jpeg = Self::encode(&decoded, quality)?;
            if jpeg.len() <= self.storage_target_bytes || quality <= STORAGE_MIN_QUALITY {
                debug!(quality, jpeg_bytes = jpeg.len(), "Compressed image for storage");
                return Ok(jpeg);
            }
            quality = quality
                .saturating_sub(STORAGE_QUALITY_STEP)
                .max(STORAGE_MIN_QUALITY);
        }
    }
}
