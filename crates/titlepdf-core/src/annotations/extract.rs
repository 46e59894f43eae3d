//! Widget annotation discovery and projection into device space

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;

use super::viewport::Viewport;
use crate::objects::{
    annotation_refs, decode_text_string, dict_at, dict_entry, dict_name, dict_text, inherited, name_of, parse_rect,
};

/// Guards the `/Parent` walk when building qualified names
const MAX_NAME_DEPTH: usize = 32;

/// A widget annotation as read from a page, still in PDF user space
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetAnnotation {
    pub rect: [f64; 4],
    /// Inherited `/FT`
    pub field_type: Option<String>,
    /// Dot-joined `/T` from the field root down
    pub field_name: Option<String>,
    /// `/TU`, the user-facing name
    pub alternative_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnnotationKind {
    Button,
    Text,
}

/// A discovered field positioned for an overlay, in device pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationField {
    pub id: String,
    pub display_name: String,
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub kind: AnnotationKind,
}

fn qualified_name(doc: &Document, widget: &Dictionary) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = Some(widget);
    for _ in 0..MAX_NAME_DEPTH {
        let Some(dict) = current else { break };
        if let Some(partial) = dict_text(doc, dict, b"T") {
            parts.push(partial);
        }
        current = dict_entry(doc, dict, b"Parent");
    }
    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join("."))
}

fn read_widget(doc: &Document, id: ObjectId) -> Option<WidgetAnnotation> {
    let annot = dict_at(doc, id)?;
    if dict_name(doc, annot, b"Subtype").as_deref() != Some("Widget") {
        return None;
    }
    let rect = parse_rect(doc, annot.get(b"Rect").ok()?)?;
    let alternative_text = inherited(doc, annot, b"TU").and_then(|obj| match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    });
    Some(WidgetAnnotation {
        rect,
        field_type: inherited(doc, annot, b"FT").and_then(name_of),
        field_name: qualified_name(doc, annot),
        alternative_text,
    })
}

/// Widget annotations on `page_id` in `/Annots` order
pub fn page_widgets(doc: &Document, page_id: ObjectId) -> Vec<WidgetAnnotation> {
    let Some(page) = dict_at(doc, page_id) else {
        return Vec::new();
    };
    annotation_refs(doc, page)
        .into_iter()
        .filter_map(|id| read_widget(doc, id))
        .collect()
}

/// Keep widgets that carry both a type and a name and project their rects.
///
/// `/FT /Btn` becomes [`AnnotationKind::Button`]; every other type is
/// treated as text.
pub fn project_widgets(page_index: usize, viewport: &Viewport, widgets: &[WidgetAnnotation]) -> Vec<AnnotationField> {
    widgets
        .iter()
        .filter_map(|widget| {
            let field_type = widget.field_type.as_deref()?;
            let name = widget.field_name.as_deref().filter(|n| !n.is_empty())?;
            let kind = if field_type == "Btn" {
                AnnotationKind::Button
            } else {
                AnnotationKind::Text
            };
            let device = viewport.convert_to_viewport_rectangle(widget.rect);
            Some(AnnotationField {
                id: name.to_string(),
                display_name: widget
                    .alternative_text
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| name.to_string()),
                page_index,
                x: device.x,
                y: device.y,
                width: device.width,
                height: device.height,
                kind,
            })
        })
        .collect()
}
