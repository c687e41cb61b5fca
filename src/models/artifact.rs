use base64::Engine;
use serde::{Deserialize, Serialize};

/// A composited image, encoded and held in memory until it is published.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeArtifact {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
}

impl CompositeArtifact {
    /// Inline `data:` URI; displayable and downloadable, but not shareable.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// An artifact stored in object storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishedArtifact {
    pub url: String,
    pub path: String,
}

/// What the presentation layer needs to show a finished session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Delivery {
    /// URL to render and download from; may be a `data:` URI.
    pub display_url: String,
    /// Externally reachable URL, present only once publishing succeeded.
    pub public_url: Option<String>,
    pub width: u32,
    pub height: u32,
    /// False when the overlay could not be applied and the raw result is shown.
    pub composited: bool,
    pub qr_enabled: bool,
}

impl Delivery {
    pub fn published(artifact: PublishedArtifact, width: u32, height: u32) -> Self {
        Self::new(artifact.url.clone(), Some(artifact.url), width, height, true)
    }

    pub fn local(display_url: String, width: u32, height: u32, composited: bool) -> Self {
        Self::new(display_url, None, width, height, composited)
    }

    fn new(
        display_url: String,
        public_url: Option<String>,
        width: u32,
        height: u32,
        composited: bool,
    ) -> Self {
        let qr_enabled = public_url.as_deref().is_some_and(is_public_url);
        Self {
            display_url,
            public_url,
            width,
            height,
            composited,
            qr_enabled,
        }
    }
}

/// QR codes only make sense for URLs another device can open.
pub fn is_public_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    ["https://", "http://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}
