//! Logical key to template field resolution
//!
//! Template authors rarely name fields after our keys exactly, so an exact
//! lookup falls back to a case-insensitive equals-or-contains scan in the
//! template's declared order.

use serde::Serialize;
use tracing::debug;

use crate::template::{FieldType, PdfTemplate, TemplateField};

/// What a logical key resolved to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum TargetField {
    Checkbox(TemplateField),
    Text(TemplateField),
    Unsupported { name: String, kind: FieldType },
}

impl TargetField {
    fn from_field(field: &TemplateField) -> Self {
        match field.kind {
            FieldType::Checkbox => TargetField::Checkbox(field.clone()),
            FieldType::Text => TargetField::Text(field.clone()),
            _ => TargetField::Unsupported {
                name: field.name.clone(),
                kind: field.kind.clone(),
            },
        }
    }

    /// Full name of the matched template field
    pub fn name(&self) -> &str {
        match self {
            TargetField::Checkbox(f) | TargetField::Text(f) => &f.name,
            TargetField::Unsupported { name, .. } => name,
        }
    }
}

/// Find the template field for `key`; `None` when nothing matches.
pub fn resolve(template: &PdfTemplate, key: &str) -> Option<TargetField> {
    let fields = template.fields();

    if let Some(exact) = fields.iter().find(|f| f.name == key) {
        return Some(TargetField::from_field(exact));
    }

    let needle = key.to_lowercase();
    let found = fields.iter().find(|f| {
        let name = f.name.to_lowercase();
        name == needle || name.contains(&needle)
    })?;
    debug!(key, field = %found.name, "Resolved by fuzzy match");
    Some(TargetField::from_field(found))
}
