//! AcroForm template loading
//!
//! Walks the interactive form's field tree once and records every terminal
//! field with its fully-qualified name, effective type and widgets.

use std::collections::HashSet;

use lopdf::{Document, ObjectId};
use serde::Serialize;
use tracing::debug;

use crate::error::TitlePdfError;
use crate::objects::{catalog_id, dict_at, dict_entry, dict_integer, dict_name, dict_text, resolve};

/// `/Ff` bit 16: radio button group
const FF_RADIO: i64 = 1 << 15;
/// `/Ff` bit 17: push button
const FF_PUSHBUTTON: i64 = 1 << 16;

/// Effective field type after `/FT` and `/Ff` inheritance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Checkbox,
    Radio,
    PushButton,
    Text,
    Choice,
    Signature,
    Unknown(String),
}

impl FieldType {
    fn classify(ft: Option<&str>, flags: i64) -> Self {
        match ft {
            Some("Btn") if flags & FF_PUSHBUTTON != 0 => FieldType::PushButton,
            Some("Btn") if flags & FF_RADIO != 0 => FieldType::Radio,
            Some("Btn") => FieldType::Checkbox,
            Some("Tx") => FieldType::Text,
            Some("Ch") => FieldType::Choice,
            Some("Sig") => FieldType::Signature,
            Some(other) => FieldType::Unknown(other.to_string()),
            None => FieldType::Unknown(String::new()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::PushButton => "push_button",
            FieldType::Text => "text",
            FieldType::Choice => "choice",
            FieldType::Signature => "signature",
            FieldType::Unknown(ft) if ft.is_empty() => "untyped",
            FieldType::Unknown(ft) => ft.as_str(),
        }
    }
}

/// A terminal form field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateField {
    /// Dot-joined partial names from the root of the field tree
    pub name: String,
    pub kind: FieldType,
    #[serde(skip)]
    pub field_id: ObjectId,
    /// Widget annotations; the field itself when field and widget are merged
    #[serde(skip)]
    pub widgets: Vec<ObjectId>,
}

/// A parsed template and its form fields in declared order
#[derive(Debug, Clone)]
pub struct PdfTemplate {
    doc: Document,
    fields: Vec<TemplateField>,
}

/// Attributes passed down the field tree
#[derive(Clone, Default)]
struct Inherited {
    name: String,
    ft: Option<String>,
    flags: i64,
}

impl PdfTemplate {
    /// Parse template bytes; a document without an AcroForm is rejected.
    pub fn load(bytes: &[u8]) -> Result<Self, TitlePdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| TitlePdfError::TemplateLoad(e.to_string()))?;
        Self::from_document(doc)
    }

    pub fn from_document(doc: Document) -> Result<Self, TitlePdfError> {
        let roots = acroform_roots(&doc)?;

        let mut fields = Vec::new();
        let mut visited = HashSet::new();
        for root in roots {
            walk_field(&doc, root, &Inherited::default(), &mut visited, &mut fields);
        }
        debug!(count = fields.len(), "Loaded template fields");

        Ok(Self { doc, fields })
    }

    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Give up the parsed document for editing
    pub fn into_parts(self) -> (Document, Vec<TemplateField>) {
        (self.doc, self.fields)
    }
}

fn acroform_roots(doc: &Document) -> Result<Vec<ObjectId>, TitlePdfError> {
    let catalog = catalog_id(doc)
        .and_then(|id| dict_at(doc, id))
        .ok_or_else(|| TitlePdfError::TemplateLoad("Document has no catalog".to_string()))?;

    let acroform = dict_entry(doc, catalog, b"AcroForm")
        .ok_or_else(|| TitlePdfError::TemplateLoad("Document has no AcroForm".to_string()))?;

    let fields = acroform
        .get(b"Fields")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .ok_or_else(|| TitlePdfError::TemplateLoad("AcroForm has no Fields array".to_string()))?;

    Ok(fields
        .iter()
        .filter_map(|obj| obj.as_reference().ok())
        .collect())
}

fn walk_field(
    doc: &Document,
    id: ObjectId,
    parent: &Inherited,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<TemplateField>,
) {
    if !visited.insert(id) {
        return;
    }
    let Some(dict) = dict_at(doc, id) else {
        return;
    };

    let mut here = parent.clone();
    if let Some(partial) = dict_text(doc, dict, b"T") {
        here.name = if parent.name.is_empty() {
            partial
        } else {
            format!("{}.{}", parent.name, partial)
        };
    }
    if let Some(ft) = dict_name(doc, dict, b"FT") {
        here.ft = Some(ft);
    }
    if let Some(flags) = dict_integer(doc, dict, b"Ff") {
        here.flags = flags;
    }

    let kids: Vec<ObjectId> = dict
        .get(b"Kids")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .map(|arr| arr.iter().filter_map(|o| o.as_reference().ok()).collect())
        .unwrap_or_default();

    // Kids carrying /T are child fields; the rest are this field's widgets
    let (child_fields, widgets): (Vec<ObjectId>, Vec<ObjectId>) = kids
        .into_iter()
        .partition(|kid| dict_at(doc, *kid).is_some_and(|k| k.has(b"T")));

    if !child_fields.is_empty() {
        for child in child_fields {
            walk_field(doc, child, &here, visited, out);
        }
        return;
    }

    if here.name.is_empty() {
        return;
    }
    let widgets = if widgets.is_empty() { vec![id] } else { widgets };
    out.push(TemplateField {
        name: here.name,
        kind: FieldType::classify(here.ft.as_deref(), here.flags),
        field_id: id,
        widgets,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, FixtureField};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_lists_fields_in_declared_order() {
        let pdf = fixtures::template(&[
            FixtureField::text("VehicleIdentificationNumber", 0, [72.0, 700.0, 300.0, 718.0]),
            FixtureField::checkbox("chkLien", 0, [72.0, 650.0, 84.0, 662.0]),
            FixtureField::text("txtMake", 1, [72.0, 600.0, 200.0, 618.0]),
        ]);
        let template = PdfTemplate::load(&pdf).unwrap();
        let names: Vec<&str> = template.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["VehicleIdentificationNumber", "chkLien", "txtMake"]);
        assert_eq!(template.fields()[1].kind, FieldType::Checkbox);
        assert_eq!(template.page_count(), 2);
    }

    #[test]
    fn test_hierarchical_names_and_inherited_type() {
        let pdf = fixtures::hierarchical_template();
        let template = PdfTemplate::load(&pdf).unwrap();
        let names: Vec<(&str, &FieldType)> = template
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), &f.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("owner.first", &FieldType::Text),
                ("owner.last", &FieldType::Text),
            ]
        );
    }

    #[test]
    fn test_missing_acroform_is_load_error() {
        let pdf = fixtures::blank_pdf(1);
        let err = PdfTemplate::load(&pdf).unwrap_err();
        assert!(matches!(err, TitlePdfError::TemplateLoad(msg) if msg.contains("AcroForm")));
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        assert!(matches!(
            PdfTemplate::load(b"<!DOCTYPE html><html></html>"),
            Err(TitlePdfError::TemplateLoad(_))
        ));
    }

    #[test]
    fn test_button_flags_classify() {
        assert_eq!(FieldType::classify(Some("Btn"), 0), FieldType::Checkbox);
        assert_eq!(FieldType::classify(Some("Btn"), FF_RADIO), FieldType::Radio);
        assert_eq!(FieldType::classify(Some("Btn"), FF_PUSHBUTTON), FieldType::PushButton);
        assert_eq!(FieldType::classify(Some("Ch"), 0).label(), "choice");
        assert_eq!(FieldType::classify(None, 0).label(), "untyped");
    }
}
