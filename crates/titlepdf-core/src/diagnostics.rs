use serde::Serialize;

/// Non-fatal findings collected while assembling a document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No template field matched the key
    FieldUnresolved { key: String },
    /// The key matched a field of a kind that cannot be filled
    UnsupportedTarget { key: String, field: String, kind: String },
    /// Writing the value failed structurally
    FieldWrite { key: String, field: String, reason: String },
    MissingPlacement { key: String },
    PageOutOfRange { key: String, page_index: usize, page_count: usize },
    /// A placement exists but no image was supplied
    EmptySignature { key: String },
    ImageDecode { key: String, reason: String },
}

impl Diagnostic {
    /// The logical key the finding is about
    pub fn key(&self) -> &str {
        match self {
            Diagnostic::FieldUnresolved { key }
            | Diagnostic::UnsupportedTarget { key, .. }
            | Diagnostic::FieldWrite { key, .. }
            | Diagnostic::MissingPlacement { key }
            | Diagnostic::PageOutOfRange { key, .. }
            | Diagnostic::EmptySignature { key }
            | Diagnostic::ImageDecode { key, .. } => key,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::FieldUnresolved { key } => write!(f, "{}: no matching template field", key),
            Diagnostic::UnsupportedTarget { key, field, kind } => {
                write!(f, "{}: field {} is a {} and cannot be filled", key, field, kind)
            }
            Diagnostic::FieldWrite { key, field, reason } => {
                write!(f, "{}: writing {} failed: {}", key, field, reason)
            }
            Diagnostic::MissingPlacement { key } => write!(f, "{}: no signature placement", key),
            Diagnostic::PageOutOfRange {
                key,
                page_index,
                page_count,
            } => write!(
                f,
                "{}: placement page {} outside document with {} pages",
                key, page_index, page_count
            ),
            Diagnostic::EmptySignature { key } => write!(f, "{}: no signature captured", key),
            Diagnostic::ImageDecode { key, reason } => write!(f, "{}: {}", key, reason),
        }
    }
}
