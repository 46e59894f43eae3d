use shared_types::{FieldValue, FormState};

use super::extract::{AnnotationField, AnnotationKind};

/// Seed a default for every discovered field not already in `existing`.
///
/// Existing values are never overwritten, so running discovery again over
/// the same page leaves user input intact.
pub fn merge_defaults(existing: &FormState, discovered: &[AnnotationField]) -> FormState {
    let mut merged = existing.clone();
    for field in discovered {
        merged.entry(field.id.clone()).or_insert_with(|| match field.kind {
            AnnotationKind::Text => FieldValue::text(""),
            AnnotationKind::Button => FieldValue::Bool(false),
        });
    }
    merged
}
