//! Writing values into resolved template fields

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::appearance::{checkbox_appearance, da_font_size, text_appearance, Alignment};
use crate::error::TitlePdfError;
use crate::objects::{
    catalog_id, dict_at, dict_entry, dict_integer, dict_text, encode_text_string, inherited, parse_rect,
    resolve,
};
use crate::template::TemplateField;

/// On-state used when a checkbox widget names none
pub const DEFAULT_ON_STATE: &str = "Yes";

/// The checkbox's on-state: the first non-`Off` key of any widget's `/AP /N`
pub fn checkbox_on_state(doc: &Document, field: &TemplateField) -> String {
    field
        .widgets
        .iter()
        .filter_map(|id| dict_at(doc, *id))
        .filter_map(|widget| dict_entry(doc, widget, b"AP"))
        .filter_map(|ap| dict_entry(doc, ap, b"N"))
        .flat_map(|normal| normal.iter().map(|(k, _)| k.clone()))
        .find(|key| key.as_slice() != b"Off")
        .map(|key| String::from_utf8_lossy(&key).into_owned())
        .unwrap_or_else(|| DEFAULT_ON_STATE.to_string())
}

fn widget_size(doc: &Document, widget: &Dictionary) -> (f64, f64) {
    widget
        .get(b"Rect")
        .ok()
        .and_then(|r| parse_rect(doc, r))
        .map(|r| (r[2] - r[0], r[3] - r[1]))
        .unwrap_or((0.0, 0.0))
}

fn dict_mut(doc: &mut Document, id: ObjectId) -> Result<&mut Dictionary, TitlePdfError> {
    doc.get_object_mut(id)
        .and_then(Object::as_dict_mut)
        .map_err(TitlePdfError::operation)
}

/// Whether `/AP /N` on the widget already holds an entry for `state`
fn has_state_appearance(doc: &Document, widget: &Dictionary, state: &str) -> bool {
    dict_entry(doc, widget, b"AP")
        .and_then(|ap| dict_entry(doc, ap, b"N"))
        .is_some_and(|normal| normal.has(state.as_bytes()))
}

/// Check or clear a checkbox, generating on/off appearances when missing.
pub fn fill_checkbox(doc: &mut Document, field: &TemplateField, checked: bool) -> Result<(), TitlePdfError> {
    let on_state = checkbox_on_state(doc, field);
    let state = if checked { on_state.as_str() } else { "Off" };

    dict_mut(doc, field.field_id)?.set("V", Object::Name(state.as_bytes().to_vec()));

    for &widget_id in &field.widgets {
        let (needs_appearance, (w, h)) = {
            let widget = dict_at(doc, widget_id)
                .ok_or_else(|| TitlePdfError::Operation(format!("Widget {:?} is not a dictionary", widget_id)))?;
            (
                !has_state_appearance(doc, widget, &on_state),
                widget_size(doc, widget),
            )
        };

        if needs_appearance {
            let on_id = doc.add_object(checkbox_appearance(w, h, true));
            let off_id = doc.add_object(checkbox_appearance(w, h, false));
            let mut normal = Dictionary::new();
            normal.set(on_state.as_bytes().to_vec(), Object::Reference(on_id));
            normal.set("Off", Object::Reference(off_id));
            let mut ap = Dictionary::new();
            ap.set("N", Object::Dictionary(normal));
            dict_mut(doc, widget_id)?.set("AP", Object::Dictionary(ap));
        }

        dict_mut(doc, widget_id)?.set("AS", Object::Name(state.as_bytes().to_vec()));
    }
    Ok(())
}

/// Truncate to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `/DA` and `/Q` for a widget, falling back to its field and the AcroForm
fn text_style(doc: &Document, widget: &Dictionary) -> (Option<f64>, Alignment) {
    let acroform = catalog_id(doc)
        .and_then(|id| dict_at(doc, id))
        .and_then(|catalog| dict_entry(doc, catalog, b"AcroForm"));

    let da = inherited(doc, widget, b"DA")
        .and_then(|obj| match obj {
            Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
        .or_else(|| acroform.and_then(|form| dict_text(doc, form, b"DA")));
    let q = inherited(doc, widget, b"Q")
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_i64().ok())
        .or_else(|| acroform.and_then(|form| dict_integer(doc, form, b"Q")))
        .unwrap_or(0);

    (da.as_deref().and_then(da_font_size), Alignment::from_q(q))
}

/// Set a text field's value and regenerate each widget's appearance.
///
/// Returns the text actually written after truncation.
pub fn fill_text(
    doc: &mut Document,
    field: &TemplateField,
    value: &str,
    max_chars: usize,
) -> Result<String, TitlePdfError> {
    let text = truncate_chars(value, max_chars).to_string();
    dict_mut(doc, field.field_id)?.set("V", encode_text_string(&text));

    for &widget_id in &field.widgets {
        let ((w, h), (font_size, alignment)) = {
            let widget = dict_at(doc, widget_id)
                .ok_or_else(|| TitlePdfError::Operation(format!("Widget {:?} is not a dictionary", widget_id)))?;
            (widget_size(doc, widget), text_style(doc, widget))
        };
        let stream_id = doc.add_object(text_appearance(w, h, &text, font_size, alignment));
        let mut ap = Dictionary::new();
        ap.set("N", Object::Reference(stream_id));
        dict_mut(doc, widget_id)?.set("AP", Object::Dictionary(ap));
    }
    Ok(text)
}
