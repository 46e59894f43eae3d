//! Document assembly: fill, embed signatures, flatten, serialize

use std::collections::BTreeSet;

use lopdf::{Document, ObjectId};
use serde::Serialize;
use shared_types::{FormState, SignatureEntry};
use tracing::{debug, info, warn};

use crate::config::AssemblerConfig;
use crate::diagnostics::Diagnostic;
use crate::error::TitlePdfError;
use crate::fill::{fill_checkbox, fill_text};
use crate::flatten::flatten;
use crate::geometry::{fit_within, PdfRect};
use crate::objects::page_box;
use crate::overlay_content::{Layer, PageOverlays};
use crate::placements::{title_placements, PlacementRegistry};
use crate::resolver::{resolve, TargetField};
use crate::signature::{decode_signature, embed_image};
use crate::template::PdfTemplate;

/// Finished PDF plus everything that was skipped along the way
#[derive(Debug, Clone, Serialize)]
pub struct AssembledDocument {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    placements: PlacementRegistry,
    config: AssemblerConfig,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(title_placements(), AssemblerConfig::default())
    }
}

impl DocumentAssembler {
    pub fn new(placements: PlacementRegistry, config: AssemblerConfig) -> Self {
        Self { placements, config }
    }

    pub fn placements(&self) -> &PlacementRegistry {
        &self.placements
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Fill `state` into the template, draw `signatures` and flatten.
    ///
    /// Only an unreadable template or a failed save is an error; every
    /// per-field or per-signature problem becomes a [`Diagnostic`].
    pub fn assemble(
        &self,
        template_bytes: &[u8],
        state: &FormState,
        signatures: &[SignatureEntry],
    ) -> Result<AssembledDocument, TitlePdfError> {
        let template = PdfTemplate::load(template_bytes)?;
        let mut diagnostics = Vec::new();

        let signature_keys: BTreeSet<&str> = self
            .placements
            .keys()
            .chain(signatures.iter().map(|s| s.key.as_str()))
            .collect();

        let targets: Vec<(&String, Option<TargetField>)> = state
            .keys()
            .filter(|key| !signature_keys.contains(key.as_str()))
            .map(|key| (key, resolve(&template, key)))
            .collect();

        let (mut doc, _) = template.into_parts();

        let mut filled = 0usize;
        for (key, target) in targets {
            let value = &state[key];
            let result = match target {
                None => {
                    diagnostics.push(Diagnostic::FieldUnresolved { key: key.clone() });
                    continue;
                }
                Some(TargetField::Unsupported { name, kind }) => {
                    diagnostics.push(Diagnostic::UnsupportedTarget {
                        key: key.clone(),
                        field: name,
                        kind: kind.label().to_string(),
                    });
                    continue;
                }
                Some(TargetField::Checkbox(field)) => {
                    fill_checkbox(&mut doc, &field, value.is_checked()).map_err(|e| (field.name, e))
                }
                Some(TargetField::Text(field)) => fill_text(&mut doc, &field, &value.to_text(), self.config.max_text_len)
                    .map(|_| ())
                    .map_err(|e| (field.name, e)),
            };
            match result {
                Ok(()) => filled += 1,
                Err((field, e)) => diagnostics.push(Diagnostic::FieldWrite {
                    key: key.clone(),
                    field,
                    reason: e.to_string(),
                }),
            }
        }

        let mut overlays = PageOverlays::new();
        let embedded = self.draw_signatures(&mut doc, &mut overlays, signatures, &mut diagnostics);

        let flattened = flatten(&mut doc, &mut overlays)?;
        overlays.write(&mut doc)?;

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| TitlePdfError::Serialization(e.to_string()))?;

        for diagnostic in &diagnostics {
            warn!(key = diagnostic.key(), "{}", diagnostic);
        }
        info!(
            filled,
            embedded,
            flattened,
            diagnostics = diagnostics.len(),
            bytes = bytes.len(),
            "Assembled title document"
        );

        Ok(AssembledDocument { bytes, diagnostics })
    }

    fn draw_signatures(
        &self,
        doc: &mut Document,
        overlays: &mut PageOverlays,
        signatures: &[SignatureEntry],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> usize {
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let mut embedded = 0;

        for entry in signatures {
            let key = entry.key.clone();
            let Some(payload) = entry.payload() else {
                diagnostics.push(Diagnostic::EmptySignature { key });
                continue;
            };
            let Some(placement) = self.placements.get(&entry.key) else {
                diagnostics.push(Diagnostic::MissingPlacement { key });
                continue;
            };
            let Some(&page_id) = pages.get(placement.page_index) else {
                diagnostics.push(Diagnostic::PageOutOfRange {
                    key,
                    page_index: placement.page_index,
                    page_count: pages.len(),
                });
                continue;
            };
            let image = match decode_signature(payload) {
                Ok(image) => image,
                Err(e) => {
                    diagnostics.push(Diagnostic::ImageDecode {
                        key,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let bounds: PdfRect = placement.to_pdf_rect(page_box(doc, page_id));
            let (w, h) = image.dimensions();
            let target = fit_within(f64::from(w), f64::from(h), bounds);
            let image_id = match embed_image(doc, &image) {
                Ok(id) => id,
                Err(e) => {
                    diagnostics.push(Diagnostic::ImageDecode {
                        key,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            overlays.draw_image(page_id, Layer::Signatures, image_id, target);
            if self.config.debug_outline {
                overlays.outline(page_id, Layer::Signatures, bounds);
            }
            debug!(key = %entry.key, page = placement.page_index, "Embedded signature");
            embedded += 1;
        }
        embedded
    }
}

/// Assemble with the title application placements and default settings
pub fn assemble(
    template_bytes: &[u8],
    state: &FormState,
    signatures: &[SignatureEntry],
) -> Result<AssembledDocument, TitlePdfError> {
    DocumentAssembler::default().assemble(template_bytes, state, signatures)
}
