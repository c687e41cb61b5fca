use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BoothError;

/// Output frame shape; fixes the composite dimensions for the flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AspectRatio {
    Portrait,
    Landscape,
}

impl AspectRatio {
    /// Target (width, height) in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AspectRatio::Portrait => (768, 1152),
            AspectRatio::Landscape => (1024, 768),
        }
    }
}

/// Subject group the generation filter is tuned for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gender {
    Male = 0,
    Female = 1,
    Boy = 2,
    Girl = 3,
}

impl TryFrom<u8> for Gender {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::Male),
            1 => Ok(Gender::Female),
            2 => Ok(Gender::Boy),
            3 => Ok(Gender::Girl),
            other => Err(format!("unknown gender code {other}")),
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> Self {
        gender as u8
    }
}

/// Single-subject selection as it arrives from the kiosk. Every field is
/// optional here; [`GenerationDraft::into_request`] decides what is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GenerationDraft {
    #[garde(required, length(min = 1))]
    pub base64: Option<String>,

    #[garde(required, range(min = 1))]
    pub filter_id: Option<u32>,

    #[garde(required)]
    pub gender: Option<u8>,

    #[garde(required)]
    pub capture_mode: Option<u32>,

    #[garde(required, length(min = 1))]
    pub ratio: Option<String>,
}

/// A validated single-subject generation request, in upstream wire form.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerationRequest {
    #[serde(rename = "base64")]
    pub image: String,
    pub filter_id: u32,
    pub gender: Gender,
    pub capture_mode: u32,
    pub ratio: AspectRatio,
}

impl GenerationDraft {
    /// Check required fields, then convert enumerated values.
    ///
    /// Missing fields are reported together, in declaration order, so the
    /// kiosk can show them all at once.
    pub fn into_request(self) -> Result<GenerationRequest, BoothError> {
        if let Err(report) = self.validate() {
            return Err(BoothError::missing(missing_fields(&report)));
        }

        let (Some(image), Some(filter_id), Some(gender), Some(capture_mode), Some(ratio)) = (
            self.base64,
            self.filter_id,
            self.gender,
            self.capture_mode,
            self.ratio,
        ) else {
            return Err(BoothError::missing(Vec::<String>::new()));
        };

        let gender = Gender::try_from(gender).map_err(|e| BoothError::invalid("gender", e))?;
        let ratio = ratio
            .parse::<AspectRatio>()
            .map_err(|_| BoothError::invalid("ratio", format!("unsupported ratio '{ratio}'")))?;

        Ok(GenerationRequest {
            image,
            filter_id,
            gender,
            capture_mode,
            ratio,
        })
    }
}

/// Multi-subject selection as it arrives from the kiosk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MultiSwapDraft {
    #[garde(required, length(min = 1))]
    pub input_image: Option<String>,

    #[garde(required)]
    pub style_id: Option<u32>,

    #[garde(skip)]
    pub overlay: Option<bool>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MultiSwapRequest {
    pub input_image: String,
    pub style_id: u32,
    pub overlay: bool,
}

impl MultiSwapDraft {
    pub fn into_request(self) -> Result<MultiSwapRequest, BoothError> {
        if let Err(report) = self.validate() {
            return Err(BoothError::missing(missing_fields(&report)));
        }

        let (Some(input_image), Some(style_id)) = (self.input_image, self.style_id) else {
            return Err(BoothError::missing(Vec::<String>::new()));
        };

        Ok(MultiSwapRequest {
            input_image,
            style_id,
            overlay: self.overlay.unwrap_or(false),
        })
    }

    /// Multi-subject output is always landscape.
    pub fn ratio(&self) -> AspectRatio {
        AspectRatio::Landscape
    }
}

fn missing_fields(report: &garde::Report) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for (path, _) in report.iter() {
        let field = path.to_string();
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    fields
}

/// A filter or workflow offered by the generation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
}

/// Flatten the upstream `{"<id>": "<name>"}` object into entries sorted by id.
pub fn catalog_from_map(value: serde_json::Value) -> Result<Vec<CatalogEntry>, BoothError> {
    let serde_json::Value::Object(map) = value else {
        return Err(BoothError::Request(
            "Expected an object of id/name pairs".to_string(),
        ));
    };

    let mut entries: Vec<CatalogEntry> = map
        .into_iter()
        .filter_map(|(id, name)| {
            let Ok(id) = id.trim().parse::<u32>() else {
                tracing::debug!(key = %id, "Skipping non-numeric catalog key");
                return None;
            };
            let name = match name {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some(CatalogEntry { id, name })
        })
        .collect();

    entries.sort_by_key(|e| e.id);
    Ok(entries)
}
