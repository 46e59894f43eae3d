//! Fixed signature positions on the title application template

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TitlePdfError;
use crate::geometry::PdfRect;

/// Where one signature is drawn, in points with `y` measured from the
/// top edge of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignaturePlacement {
    pub key: String,
    /// 0-based
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SignaturePlacement {
    pub fn new(key: &str, page_index: usize, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            key: key.to_string(),
            page_index,
            x,
            y,
            width,
            height,
        }
    }

    /// Placement box in user space for a page with the given MediaBox
    pub fn to_pdf_rect(&self, page_box: [f64; 4]) -> PdfRect {
        PdfRect::from_top_left(page_box, self.x, self.y, self.width, self.height)
    }
}

/// Read-only table from signature key to placement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementRegistry {
    placements: BTreeMap<String, SignaturePlacement>,
}

impl PlacementRegistry {
    pub fn new(placements: impl IntoIterator<Item = SignaturePlacement>) -> Self {
        Self {
            placements: placements
                .into_iter()
                .map(|p| (p.key.clone(), p))
                .collect(),
        }
    }

    /// Parse a JSON array of placements; a repeated key is rejected
    pub fn from_json(json: &str) -> Result<Self, TitlePdfError> {
        let list: Vec<SignaturePlacement> =
            serde_json::from_str(json).map_err(|e| TitlePdfError::Serialization(e.to_string()))?;
        let mut placements = BTreeMap::new();
        for placement in list {
            if !(placement.width > 0.0 && placement.height > 0.0) {
                return Err(TitlePdfError::Serialization(format!(
                    "Placement {} must have a positive size",
                    placement.key
                )));
            }
            let key = placement.key.clone();
            if placements.insert(key.clone(), placement).is_some() {
                return Err(TitlePdfError::Serialization(format!("Duplicate placement {}", key)));
            }
        }
        Ok(Self { placements })
    }

    pub fn get(&self, key: &str) -> Option<&SignaturePlacement> {
        self.placements.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.placements.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.placements.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignaturePlacement> {
        self.placements.values()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Signature boxes on the two-page vehicle title application
pub fn title_placements() -> PlacementRegistry {
    PlacementRegistry::new([
        SignaturePlacement::new("applicantSignature", 0, 56.0, 668.0, 220.0, 28.0),
        SignaturePlacement::new("coApplicantSignature", 0, 330.0, 668.0, 220.0, 28.0),
        SignaturePlacement::new("sellerSignature", 1, 56.0, 402.0, 220.0, 28.0),
    ])
}
