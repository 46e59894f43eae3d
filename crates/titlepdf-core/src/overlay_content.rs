//! Per-page content appended on top of the template
//!
//! Drawing operations are buffered per page and written once: the page's
//! original content streams are wrapped in `q`/`Q` so whatever graphics
//! state they leave behind cannot leak into the overlay.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::TitlePdfError;
use crate::geometry::PdfRect;
use crate::objects::{dict_at, inherited, resolve};

/// Draw order inside one page's overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    /// Flattened field appearances
    Fields,
    /// Signature images and their outlines
    Signatures,
}

#[derive(Debug, Default)]
struct PageOverlay {
    ops: BTreeMap<Layer, String>,
    xobjects: BTreeMap<String, ObjectId>,
}

/// Buffered overlay content for every touched page
#[derive(Debug, Default)]
pub struct PageOverlays {
    pages: BTreeMap<ObjectId, PageOverlay>,
    next_name: usize,
}

impl PageOverlays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Paint `xobject` on `page_id` under `matrix`
    pub fn draw_xobject(&mut self, page_id: ObjectId, layer: Layer, xobject: ObjectId, matrix: [f64; 6]) {
        self.next_name += 1;
        let name = format!("TfX{}", self.next_name);
        let [a, b, c, d, e, f] = matrix;
        let page = self.pages.entry(page_id).or_default();
        page.ops.entry(layer).or_default().push_str(&format!(
            "q {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} cm /{} Do Q\n",
            a, b, c, d, e, f, name
        ));
        page.xobjects.insert(name, xobject);
    }

    /// Paint an image XObject stretched over `rect`
    pub fn draw_image(&mut self, page_id: ObjectId, layer: Layer, image: ObjectId, rect: PdfRect) {
        self.draw_xobject(page_id, layer, image, [rect.width, 0.0, 0.0, rect.height, rect.x, rect.y]);
    }

    /// Stroke a thin red rectangle
    pub fn outline(&mut self, page_id: ObjectId, layer: Layer, rect: PdfRect) {
        let page = self.pages.entry(page_id).or_default();
        page.ops.entry(layer).or_default().push_str(&format!(
            "q 1 0 0 RG 0.5 w {:.4} {:.4} {:.4} {:.4} re S Q\n",
            rect.x, rect.y, rect.width, rect.height
        ));
    }

    /// Write every buffered overlay into its page
    pub fn write(self, doc: &mut Document) -> Result<(), TitlePdfError> {
        for (page_id, overlay) in self.pages {
            let content: String = overlay.ops.into_values().collect();
            if content.is_empty() {
                continue;
            }
            register_xobjects(doc, page_id, &overlay.xobjects)?;
            append_isolated_content(doc, page_id, content.into_bytes())?;
        }
        Ok(())
    }
}

/// Content stream ids of a page, in drawing order
fn content_refs(doc: &Document, page: &Dictionary) -> Vec<ObjectId> {
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => vec![*id],
        },
        Ok(Object::Array(arr)) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => Vec::new(),
    }
}

fn append_isolated_content(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> Result<(), TitlePdfError> {
    let existing = dict_at(doc, page_id)
        .map(|page| content_refs(doc, page))
        .ok_or_else(|| TitlePdfError::Operation(format!("Page {:?} is not a dictionary", page_id)))?;

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if !existing.is_empty() {
        let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(open));
        contents.extend(existing.into_iter().map(Object::Reference));
        let mut tail = b"\nQ\n".to_vec();
        tail.extend(overlay);
        let close = doc.add_object(Stream::new(Dictionary::new(), tail));
        contents.push(Object::Reference(close));
    } else {
        let only = doc.add_object(Stream::new(Dictionary::new(), overlay));
        contents.push(Object::Reference(only));
    }

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(TitlePdfError::operation)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Merge `entries` into the page's `/Resources /XObject`.
///
/// Inherited or shared resources are copied onto the page first, so other
/// pages never see these names.
fn register_xobjects(
    doc: &mut Document,
    page_id: ObjectId,
    entries: &BTreeMap<String, ObjectId>,
) -> Result<(), TitlePdfError> {
    let mut resources = dict_at(doc, page_id)
        .and_then(|page| inherited(doc, page, b"Resources"))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let taken: BTreeSet<Vec<u8>> = xobjects.iter().map(|(k, _)| k.clone()).collect();
    for (name, id) in entries {
        if taken.contains(name.as_bytes()) {
            return Err(TitlePdfError::Operation(format!(
                "XObject name {} already used on page {:?}",
                name, page_id
            )));
        }
        xobjects.set(name.as_bytes().to_vec(), Object::Reference(*id));
    }
    resources.set("XObject", Object::Dictionary(xobjects));

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(TitlePdfError::operation)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}
