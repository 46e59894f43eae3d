//! Small lopdf helpers shared by the template reader, filler and flattener

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

/// US Letter, used when a page and its ancestors carry no MediaBox
pub const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Limit on `/Parent` hops; guards against cyclic page or field trees
const MAX_PARENT_DEPTH: usize = 32;

/// Follow a reference (once) to the object it names
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Dictionary stored at `id`
pub fn dict_at(doc: &Document, id: ObjectId) -> Option<&Dictionary> {
    doc.get_object(id).ok()?.as_dict().ok()
}

/// Resolve `key` in `dict` to a dictionary, direct or referenced
pub fn dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    resolve(doc, dict.get(key).ok()?)?.as_dict().ok()
}

/// Extract a number from a PDF object
pub fn extract_number(doc: &Document, obj: &Object) -> Option<f64> {
    match resolve(doc, obj)? {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Parse a rectangle array into normalized `[x0, y0, x1, y1]` (x0 <= x1, y0 <= y1)
pub fn parse_rect(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let arr = resolve(doc, obj)?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut v = [0.0f64; 4];
    for (slot, item) in v.iter_mut().zip(arr) {
        *slot = extract_number(doc, item)?;
    }
    Some([v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3])])
}

pub fn name_of(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        _ => None,
    }
}

/// `/Key` of `dict` as a name, following one reference
pub fn dict_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    name_of(resolve(doc, dict.get(key).ok()?)?)
}

/// `/Key` of `dict` as a decoded text string
pub fn dict_text(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match resolve(doc, dict.get(key).ok()?)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

pub fn dict_integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match resolve(doc, dict.get(key).ok()?)? {
        Object::Integer(i) => Some(*i),
        Object::Real(r) => Some(*r as i64),
        _ => None,
    }
}

/// Look `key` up on `dict`, then on each `/Parent` in turn
pub fn inherited<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = dict;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        current = dict_entry(doc, current, b"Parent")?;
    }
    None
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, else PDFDocEncoding)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    // PDFDocEncoding agrees with Latin-1 for the printable range
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode text as a literal string, switching to UTF-16BE when it is not ASCII
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Page MediaBox as `[x0, y0, x1, y1]`, inherited from the page tree if needed
pub fn page_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    dict_at(doc, page_id)
        .and_then(|page| inherited(doc, page, b"MediaBox"))
        .and_then(|obj| parse_rect(doc, obj))
        .unwrap_or(LETTER)
}

/// Page `/Rotate`, inherited, normalized to 0, 90, 180 or 270
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    let raw = dict_at(doc, page_id)
        .and_then(|page| inherited(doc, page, b"Rotate"))
        .and_then(|obj| extract_number(doc, obj))
        .unwrap_or(0.0) as i64;
    normalize_rotation(raw)
}

pub fn normalize_rotation(degrees: i64) -> i64 {
    (degrees.rem_euclid(360) / 90) * 90
}

/// Catalog object id from the trailer
pub fn catalog_id(doc: &Document) -> Option<ObjectId> {
    doc.trailer.get(b"Root").ok()?.as_reference().ok()
}

/// References held by a page's `/Annots`, direct or via an indirect array
pub fn annotation_refs(doc: &Document, page: &Dictionary) -> Vec<ObjectId> {
    page.get(b"Annots")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .map(|arr| arr.iter().filter_map(|o| o.as_reference().ok()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_parse_rect_normalizes_corners() {
        let doc = Document::with_version("1.7");
        let rect = Object::Array(vec![
            Object::Integer(300),
            Object::Real(700.5),
            Object::Integer(100),
            Object::Integer(680),
        ]);
        assert_eq!(parse_rect(&doc, &rect), Some([100.0, 680.0, 300.0, 700.5]));
    }

    #[test]
    fn test_parse_rect_rejects_short_arrays() {
        let doc = Document::with_version("1.7");
        let rect = Object::Array(vec![Object::Integer(1), Object::Integer(2)]);
        assert_eq!(parse_rect(&doc, &rect), None);
    }

    #[test]
    fn test_decode_utf16_field_name() {
        let bytes = [0xFE, 0xFF, 0x00, b'V', 0x00, b'I', 0x00, b'N'];
        assert_eq!(decode_text_string(&bytes), "VIN");
        assert_eq!(decode_text_string(b"txtMake"), "txtMake");
    }

    #[test]
    fn test_encode_text_string_round_trips() {
        for text in ["Honda", "Peña"] {
            let obj = encode_text_string(text);
            let bytes = obj.as_str().unwrap();
            assert_eq!(decode_text_string(bytes), text);
        }
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Rotate" => -90,
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        assert_eq!(page_box(&doc, page_id), [0.0, 0.0, 595.0, 842.0]);
        assert_eq!(page_rotation(&doc, page_id), 270);
    }

    #[test]
    fn test_missing_media_box_defaults_to_letter() {
        let mut doc = Document::with_version("1.7");
        let page_id = doc.add_object(dictionary! { "Type" => "Page" });
        assert_eq!(page_box(&doc, page_id), LETTER);
    }
}
