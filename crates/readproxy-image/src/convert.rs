//! Fetch-and-convert pipeline.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use thiserror::Error;
use tracing::{debug, error};

use readproxy_core::{ImageConverter, JpegImage, ProxyError};

const JPEG_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Upstream request failed with status {0}")]
    UpstreamStatus(u16),

    #[error("{0}")]
    Fetch(String),

    #[error("Failed to convert image to JPEG")]
    Conversion,
}

/// Fetches a remote image and returns JPEG bytes.
pub struct JpegFetcher {
    client: reqwest::Client,
}

impl JpegFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, String), ImageError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::UpstreamStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;

        Ok((bytes.to_vec(), content_type))
    }

    /// Fetch `url`, passing JPEG upstreams through and converting
    /// everything else.
    pub async fn fetch_and_convert(&self, url: &str) -> Result<JpegImage, ImageError> {
        let (bytes, content_type) = self.fetch(url).await?;

        if is_jpeg_content_type(&content_type) {
            debug!(url, "upstream already JPEG, passing through");
            return Ok(JpegImage {
                bytes,
                content_type: JPEG_CONTENT_TYPE.to_string(),
            });
        }

        let converted = convert_to_jpeg(&bytes).map_err(|e| {
            error!(url, "JPEG conversion failed: {}", e);
            ImageError::Conversion
        })?;

        Ok(JpegImage {
            bytes: converted,
            content_type: JPEG_CONTENT_TYPE.to_string(),
        })
    }
}

impl Default for JpegFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageConverter for JpegFetcher {
    async fn fetch_jpeg(&self, url: &str) -> Result<JpegImage, ProxyError> {
        self.fetch_and_convert(url)
            .await
            .map_err(|e| ProxyError::ImageConvert(e.to_string()))
    }
}

fn is_jpeg_content_type(content_type: &str) -> bool {
    let normalized = content_type.to_ascii_lowercase();
    normalized.contains("image/jpeg") || normalized.contains("image/jpg")
}

/// Decode, flatten transparency onto white and re-encode as JPEG.
fn convert_to_jpeg(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgba = decoded.to_rgba8();

    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    let mut out = Vec::new();
    flattened.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)?;
    Ok(out)
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
