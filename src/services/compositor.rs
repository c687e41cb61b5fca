//! Overlay compositing and capture normalisation.
//!
//! Composites are built on a cleared RGBA surface of the target size: the
//! generated image is center-cropped to the target aspect and scaled to fill,
//! then the branding overlay is stretched over the full surface and alpha
//! blended on top. Output is JPEG at a fixed quality, so identical inputs give
//! identical bytes.

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};

use crate::error::BoothError;
use crate::models::artifact::CompositeArtifact;
use crate::models::generation::AspectRatio;
use crate::services::data_uri::{decode_base64, DataUri};

const JPEG_QUALITY: u8 = 90;
const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Where an image to composite comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Bare base64 payload, as returned in job output.
    Base64(String),
    DataUri(String),
    /// Remote image fetched over HTTP(S).
    Url(String),
    Path(PathBuf),
}

impl ImageSource {
    /// Classify a generated-image payload from job output.
    pub fn from_generated(payload: &str) -> Self {
        let trimmed = payload.trim();
        if trimmed.starts_with("data:") {
            ImageSource::DataUri(trimmed.to_string())
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ImageSource::Url(trimmed.to_string())
        } else {
            ImageSource::Base64(trimmed.to_string())
        }
    }

    /// Classify a configured overlay location (URL or filesystem path).
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            ImageSource::Url(location.to_string())
        } else {
            ImageSource::Path(PathBuf::from(location))
        }
    }

    /// Something the kiosk can put in an `<img src>` without compositing.
    pub fn display_url(&self) -> String {
        match self {
            ImageSource::Base64(payload) => format!("data:image/jpeg;base64,{payload}"),
            ImageSource::DataUri(uri) | ImageSource::Url(uri) => uri.clone(),
            ImageSource::Path(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Base64(payload) => write!(f, "base64 payload ({} chars)", payload.len()),
            ImageSource::DataUri(uri) => write!(f, "data URI ({} chars)", uri.len()),
            ImageSource::Url(url) => write!(f, "{url}"),
            ImageSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Source region to keep so that it matches the target aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Center-crop `src` along its longer dimension (relative to the target
/// aspect) so it can be scaled to `dst` without distortion.
pub fn center_crop(src_width: u32, src_height: u32, dst_width: u32, dst_height: u32) -> CropRect {
    let (sw, sh) = (src_width as u64, src_height as u64);
    let (dw, dh) = (dst_width.max(1) as u64, dst_height.max(1) as u64);

    if sw * dh > dw * sh {
        // Source is wider than the target: trim the sides.
        let width = ((sh * dw) / dh).clamp(1, sw.max(1)) as u32;
        CropRect {
            x: (src_width - width) / 2,
            y: 0,
            width,
            height: src_height,
        }
    } else {
        let height = ((sw * dh) / dw).clamp(1, sh.max(1)) as u32;
        CropRect {
            x: 0,
            y: (src_height - height) / 2,
            width: src_width,
            height,
        }
    }
}

/// Crop to the target aspect and scale to exactly `width` x `height`.
fn cover(image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let (src_width, src_height) = image.dimensions();
    let rect = center_crop(src_width, src_height, width, height);
    image
        .crop_imm(rect.x, rect.y, rect.width, rect.height)
        .resize_exact(width, height, RESAMPLE_FILTER)
        .to_rgba8()
}

/// Layer `overlay` over `generated` on a `width` x `height` surface.
pub fn composite(
    generated: &DynamicImage,
    overlay: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<CompositeArtifact, BoothError> {
    let mut surface = RgbaImage::new(width, height);

    let base = cover(generated, width, height);
    imageops::overlay(&mut surface, &base, 0, 0);

    let top = overlay.resize_exact(width, height, RESAMPLE_FILTER).to_rgba8();
    imageops::overlay(&mut surface, &top, 0, 0);

    let rgb = DynamicImage::ImageRgba8(surface).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| BoothError::Encode(e.to_string()))?;

    Ok(CompositeArtifact {
        bytes,
        width,
        height,
        content_type: "image/jpeg",
    })
}

/// Turn a raw camera frame into the base64 PNG submitted for generation.
///
/// The frame is center-cropped to the ratio's aspect and scaled to its target
/// dimensions, so subjects stay centered and are never squeezed.
pub fn normalize_capture(frame: &[u8], ratio: AspectRatio) -> Result<String, BoothError> {
    let image = image::load_from_memory(frame).map_err(|e| BoothError::ImageLoad {
        image: "camera capture".to_string(),
        reason: e.to_string(),
    })?;

    let (width, height) = ratio.dimensions();
    let normalized = cover(&image, width, height);

    let mut png = Cursor::new(Vec::new());
    normalized
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| BoothError::Encode(e.to_string()))?;

    Ok(base64::engine::general_purpose::STANDARD.encode(png.into_inner()))
}

/// Loads both images for a composite and layers them.
pub struct Compositor {
    http: reqwest::Client,
    overlay: ImageSource,
}

impl Compositor {
    pub fn new(http: reqwest::Client, overlay: ImageSource) -> Self {
        Self { http, overlay }
    }

    /// Composite `generated` under the overlay at `width` x `height`.
    ///
    /// Both images are loaded together; if either fails the error names it.
    pub async fn compose(
        &self,
        generated: &ImageSource,
        width: u32,
        height: u32,
    ) -> Result<CompositeArtifact, BoothError> {
        let (generated_image, overlay_image) =
            tokio::join!(self.load(generated), self.load(&self.overlay));
        let generated_image = generated_image?;
        let overlay_image = overlay_image?;

        let artifact = composite(&generated_image, &overlay_image, width, height)?;
        tracing::debug!(
            width,
            height,
            bytes = artifact.bytes.len(),
            "Composite created"
        );
        Ok(artifact)
    }

    /// Check that the overlay can be loaded and decoded.
    pub async fn check_overlay(&self) -> Result<(u32, u32), BoothError> {
        self.load(&self.overlay).await.map(|image| image.dimensions())
    }

    async fn load(&self, source: &ImageSource) -> Result<DynamicImage, BoothError> {
        let load_error = |reason: String| BoothError::ImageLoad {
            image: source.to_string(),
            reason,
        };

        let bytes = match source {
            ImageSource::Base64(payload) => {
                decode_base64(payload).map_err(|e| load_error(e.to_string()))?
            }
            ImageSource::DataUri(uri) => DataUri::parse(uri).map_err(|e| load_error(e.to_string()))?.bytes,
            ImageSource::Url(url) => {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| load_error(e.to_string()))?;
                response
                    .bytes()
                    .await
                    .map_err(|e| load_error(e.to_string()))?
                    .to_vec()
            }
            ImageSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| load_error(e.to_string()))?,
        };

        image::load_from_memory(&bytes).map_err(|e| load_error(e.to_string()))
    }
}
