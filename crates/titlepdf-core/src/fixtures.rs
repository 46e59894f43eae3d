//! In-memory templates and signature images for tests

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Text,
    Checkbox,
    /// Checkbox without an /AP dictionary
    BareCheckbox,
    Radio,
}

/// One merged field/widget on a fixture template
#[derive(Debug, Clone)]
pub struct FixtureField {
    pub name: String,
    pub kind: FixtureKind,
    pub page: usize,
    pub rect: [f64; 4],
}

impl FixtureField {
    fn new(name: &str, kind: FixtureKind, page: usize, rect: [f64; 4]) -> Self {
        Self {
            name: name.to_string(),
            kind,
            page,
            rect,
        }
    }

    pub fn text(name: &str, page: usize, rect: [f64; 4]) -> Self {
        Self::new(name, FixtureKind::Text, page, rect)
    }

    pub fn checkbox(name: &str, page: usize, rect: [f64; 4]) -> Self {
        Self::new(name, FixtureKind::Checkbox, page, rect)
    }

    pub fn bare_checkbox(name: &str, page: usize, rect: [f64; 4]) -> Self {
        Self::new(name, FixtureKind::BareCheckbox, page, rect)
    }

    pub fn radio(name: &str, page: usize, rect: [f64; 4]) -> Self {
        Self::new(name, FixtureKind::Radio, page, rect)
    }
}

fn real_array(values: [f64; 4]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v as f32)).collect())
}

fn build_pages(doc: &mut Document, count: usize) -> (ObjectId, Vec<ObjectId>) {
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut page_ids = Vec::with_capacity(count);
    for n in 0..count.max(1) {
        let content = format!("BT /F1 14 Tf 72 750 Td (Application for Title - page {}) Tj ET", n + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => page_ids.len() as i64,
        }),
    );
    (pages_id, page_ids)
}

fn finish(mut doc: Document, pages_id: ObjectId, acroform: Option<Dictionary>) -> Vec<u8> {
    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if let Some(form) = acroform {
        let form_id = doc.add_object(form);
        catalog.set("AcroForm", form_id);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn checkbox_states(doc: &mut Document, rect: [f64; 4]) -> Dictionary {
    let (w, h) = (rect[2] - rect[0], rect[3] - rect[1]);
    let on = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => real_array([0.0, 0.0, w, h]),
        },
        format!("q 0 g BT /ZaDb {} Tf 2 2 Td (4) Tj ET Q", h * 0.8).into_bytes(),
    ));
    let off = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => real_array([0.0, 0.0, w, h]),
        },
        Vec::new(),
    ));
    dictionary! { "On" => on, "Off" => off }
}

fn add_to_annots(doc: &mut Document, page_id: ObjectId, annot_id: ObjectId) {
    if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
        if let Ok(Object::Array(annots)) = page.get_mut(b"Annots") {
            annots.push(Object::Reference(annot_id));
        } else {
            page.set("Annots", vec![Object::Reference(annot_id)]);
        }
    }
}

/// Template with one merged field/widget per entry; checkboxes use `On` as
/// their on-state so tests can tell it apart from the `Yes` fallback.
pub fn template(fields: &[FixtureField]) -> Vec<u8> {
    let page_count = fields.iter().map(|f| f.page + 1).max().unwrap_or(1);
    let mut doc = Document::with_version("1.7");
    let (pages_id, page_ids) = build_pages(&mut doc, page_count);

    let mut field_refs = Vec::new();
    for field in fields {
        let page_id = page_ids[field.page];
        let mut widget = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "T" => Object::string_literal(field.name.as_str()),
            "Rect" => real_array(field.rect),
            "P" => page_id,
            "F" => 4,
        };
        match field.kind {
            FixtureKind::Text => {
                widget.set("FT", "Tx");
                widget.set("DA", Object::string_literal("/Helv 0 Tf 0 g"));
            }
            FixtureKind::Checkbox => {
                widget.set("FT", "Btn");
                widget.set("V", "Off");
                widget.set("AS", "Off");
                let states = checkbox_states(&mut doc, field.rect);
                widget.set("AP", dictionary! { "N" => states });
            }
            FixtureKind::BareCheckbox => {
                widget.set("FT", "Btn");
            }
            FixtureKind::Radio => {
                widget.set("FT", "Btn");
                widget.set("Ff", 1 << 15);
            }
        }
        let widget_id = doc.add_object(widget);
        add_to_annots(&mut doc, page_id, widget_id);
        field_refs.push(Object::Reference(widget_id));
    }

    let acroform = dictionary! {
        "Fields" => field_refs,
        "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
    };
    finish(doc, pages_id, Some(acroform))
}

/// Template whose fields hang under a typed, unnamed-widget parent:
/// `owner` (FT Tx) with kids `first` and `last`.
pub fn hierarchical_template() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let (pages_id, page_ids) = build_pages(&mut doc, 1);
    let page_id = page_ids[0];

    let parent_id = doc.new_object_id();
    let mut kids = Vec::new();
    for (name, y) in [("first", 700.0), ("last", 670.0)] {
        let kid = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Parent" => parent_id,
            "T" => Object::string_literal(name),
            "Rect" => real_array([72.0, y, 272.0, y + 18.0]),
            "P" => page_id,
        });
        add_to_annots(&mut doc, page_id, kid);
        kids.push(Object::Reference(kid));
    }
    doc.objects.insert(
        parent_id,
        Object::Dictionary(dictionary! {
            "T" => Object::string_literal("owner"),
            "FT" => "Tx",
            "Kids" => kids,
        }),
    );

    let acroform = dictionary! { "Fields" => vec![Object::Reference(parent_id)] };
    finish(doc, pages_id, Some(acroform))
}

/// A plain document with no interactive form
pub fn blank_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let (pages_id, _) = build_pages(&mut doc, pages);
    finish(doc, pages_id, None)
}

/// Solid image with a transparent left column, encoded as `format`
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x == 0 {
            Rgba([255, 255, 255, 0])
        } else {
            Rgba([20, 20, 120, 255])
        }
    });
    let mut out = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut out, ImageFormat::Jpeg)
            .unwrap(),
        other => img.write_to(&mut out, other).unwrap(),
    }
    out.into_inner()
}

/// `data:image/png;base64,...` URL for a `width` x `height` PNG
pub fn png_data_url(width: u32, height: u32) -> String {
    format!(
        "data:image/png;base64,{}",
        STANDARD.encode(image_bytes(width, height, ImageFormat::Png))
    )
}

/// Bare base64 JPEG payload
pub fn jpeg_base64(width: u32, height: u32) -> String {
    STANDARD.encode(image_bytes(width, height, ImageFormat::Jpeg))
}
