//! Baking widget appearances into page content

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::TitlePdfError;
use crate::objects::{annotation_refs, catalog_id, dict_at, dict_entry, dict_integer, dict_name, parse_rect};
use crate::overlay_content::{Layer, PageOverlays};

/// Annotation flag bit 2
const FLAG_HIDDEN: i64 = 1 << 1;

/// The widget's current normal appearance: `/AP /N` itself, or the entry
/// selected by `/AS` when `/N` holds one stream per state.
fn current_appearance(doc: &Document, widget_id: ObjectId) -> Option<ObjectId> {
    let widget = dict_at(doc, widget_id)?;
    let ap = dict_entry(doc, widget, b"AP")?;
    match ap.get(b"N").ok()? {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Stream(_) => Some(*id),
            Object::Dictionary(states) => {
                let state = dict_name(doc, widget, b"AS")?;
                states.get(state.as_bytes()).ok()?.as_reference().ok()
            }
            _ => None,
        },
        Object::Dictionary(states) => {
            let state = dict_name(doc, widget, b"AS")?;
            states.get(state.as_bytes()).ok()?.as_reference().ok()
        }
        _ => None,
    }
}

/// Matrix mapping the appearance BBox onto the widget Rect
fn placement_matrix(doc: &Document, widget_id: ObjectId, stream_id: ObjectId) -> Option<[f64; 6]> {
    let widget = dict_at(doc, widget_id)?;
    let rect = parse_rect(doc, widget.get(b"Rect").ok()?)?;
    let stream = doc.get_object(stream_id).ok()?.as_stream().ok()?;
    let bbox = parse_rect(doc, stream.dict.get(b"BBox").ok()?)?;

    let (bw, bh) = (bbox[2] - bbox[0], bbox[3] - bbox[1]);
    if bw <= 0.0 || bh <= 0.0 {
        return None;
    }
    let sx = (rect[2] - rect[0]) / bw;
    let sy = (rect[3] - rect[1]) / bh;
    Some([sx, 0.0, 0.0, sy, rect[0] - bbox[0] * sx, rect[1] - bbox[1] * sy])
}

fn is_widget(doc: &Document, id: ObjectId) -> bool {
    dict_at(doc, id)
        .and_then(|annot| dict_name(doc, annot, b"Subtype"))
        .is_some_and(|subtype| subtype == "Widget")
}

/// Queue every visible widget appearance for drawing, drop widget
/// annotations from `/Annots` and remove the catalog's `/AcroForm`.
///
/// Returns the number of appearances drawn.
pub fn flatten(doc: &mut Document, overlays: &mut PageOverlays) -> Result<usize, TitlePdfError> {
    let mut drawn = 0;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in pages {
        let annots = dict_at(doc, page_id)
            .map(|page| annotation_refs(doc, page))
            .unwrap_or_default();
        if annots.is_empty() {
            continue;
        }

        let (widgets, others): (Vec<ObjectId>, Vec<ObjectId>) =
            annots.into_iter().partition(|id| is_widget(doc, *id));

        for widget_id in &widgets {
            let hidden = dict_at(doc, *widget_id)
                .and_then(|w| dict_integer(doc, w, b"F"))
                .is_some_and(|flags| flags & FLAG_HIDDEN != 0);
            if hidden {
                continue;
            }
            let Some(stream_id) = current_appearance(doc, *widget_id) else {
                continue;
            };
            let Some(matrix) = placement_matrix(doc, *widget_id, stream_id) else {
                continue;
            };
            if let Ok(Object::Stream(stream)) = doc.get_object_mut(stream_id) {
                stream.dict.set("Type", "XObject");
                stream.dict.set("Subtype", "Form");
            }
            overlays.draw_xobject(page_id, Layer::Fields, stream_id, matrix);
            drawn += 1;
        }

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(TitlePdfError::operation)?;
        if others.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", others.into_iter().map(Object::Reference).collect::<Vec<_>>());
        }
    }

    if let Some(catalog_id) = catalog_id(doc) {
        if let Ok(catalog) = doc.get_object_mut(catalog_id).and_then(Object::as_dict_mut) {
            catalog.remove(b"AcroForm");
        }
    }
    debug!(drawn, "Flattened widget appearances");
    Ok(drawn)
}
