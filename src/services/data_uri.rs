use base64::Engine;

use crate::error::BoothError;

/// A decoded `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn parse(uri: &str) -> Result<Self, BoothError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| BoothError::invalid("image", "Invalid image format"))?;

        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| BoothError::invalid("image", "Invalid image format"))?;

        if mime.is_empty() || payload.is_empty() {
            return Err(BoothError::invalid("image", "Invalid image format"));
        }

        let bytes = decode_base64(payload)
            .map_err(|e| BoothError::invalid("image", format!("Invalid base64 payload: {e}")))?;

        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    /// File extension matching the MIME type, defaulting to `jpg`.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

/// Decode standard base64, tolerating embedded whitespace from line-wrapped payloads.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD.decode(compact)
}
