//! Signature image decoding and embedding

use std::io::Write;

use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::{write::ZlibEncoder, Compression};
use image::{ImageFormat, RgbaImage};
use lopdf::{dictionary, Document, ObjectId, Stream};

/// Why a signature payload could not become an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    Base64(String),
    /// Neither PNG nor JPEG
    Image(String),
    /// Pixel data could not be compressed for embedding
    Encode(String),
}

impl std::fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeFailure::Base64(e) => write!(f, "invalid base64: {}", e),
            DecodeFailure::Image(e) => write!(f, "not a PNG or JPEG image: {}", e),
            DecodeFailure::Encode(e) => write!(f, "failed to compress image data: {}", e),
        }
    }
}

/// Decode a base64 payload (data-URL header already stripped) into RGBA.
///
/// PNG is tried first since canvas captures are PNG; JPEG covers uploads.
pub fn decode_signature(payload: &str) -> Result<RgbaImage, DecodeFailure> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DecodeFailure::Base64(e.to_string()))?;

    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).or_else(|png_err| {
        image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
            .map_err(|jpeg_err| DecodeFailure::Image(format!("png: {}; jpeg: {}", png_err, jpeg_err)))
    })?;
    Ok(decoded.to_rgba8())
}

fn deflate_into<W: Write>(sink: W, data: &[u8]) -> std::io::Result<W> {
    let mut encoder = ZlibEncoder::new(sink, Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, DecodeFailure> {
    deflate_into(Vec::new(), data).map_err(|e| DecodeFailure::Encode(e.to_string()))
}

/// Add the image as an RGB XObject with a grayscale soft mask.
///
/// Nothing is added to `doc` unless both streams compress.
pub fn embed_image(doc: &mut Document, img: &RgbaImage) -> Result<ObjectId, DecodeFailure> {
    let (width, height) = img.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in img.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }
    let alpha = deflate(&alpha)?;
    let rgb = deflate(&rgb)?;

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        alpha,
    ));

    Ok(doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
            "SMask" => smask_id,
        },
        rgb,
    )))
}
