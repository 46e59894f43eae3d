use std::collections::BTreeMap;

/// Live form values keyed by field id.
///
/// Ordered so that anything iterating the state (validation reports, PDF
/// filling) visits keys in the same order on every run.
pub type FormState = BTreeMap<String, FieldValue>;

/// Per-field error strings; an empty string means the field is valid.
pub type ErrorMap = BTreeMap<String, String>;

/// A single form value: text for text-like fields, a flag for checkboxes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Empty text (after trimming) or an unchecked box
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Bool(b) => !b,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Text(_) => None,
        }
    }

    /// Whether the value should tick a checkbox: `true`, `"true"` or `"1"`.
    pub fn is_checked(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => s == "true" || s == "1",
        }
    }

    /// String form used when writing into a text target.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// A captured signature image destined for a fixed placement.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureEntry {
    pub key: String,
    /// `data:image/png;base64,...` URL or a bare base64 payload
    #[serde(default)]
    pub data_url: Option<String>,
}

impl SignatureEntry {
    pub fn new(key: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data_url: Some(data_url.into()),
        }
    }

    /// The base64 payload with any data-URL header removed, if non-empty.
    pub fn payload(&self) -> Option<&str> {
        let raw = self.data_url.as_deref()?.trim();
        let payload = match raw.split_once(',') {
            Some((header, rest)) if header.starts_with("data:") => rest,
            _ => raw,
        };
        if payload.trim().is_empty() {
            None
        } else {
            Some(payload.trim())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_value_serializes_untagged() {
        let mut state = FormState::new();
        state.insert("vin".to_string(), FieldValue::text("1HGCM82633A004352"));
        state.insert("hasLien".to_string(), FieldValue::Bool(true));

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"hasLien":true,"vin":"1HGCM82633A004352"}"#);

        let back: FormState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_is_checked_accepts_string_forms() {
        assert!(FieldValue::Bool(true).is_checked());
        assert!(FieldValue::text("true").is_checked());
        assert!(FieldValue::text("1").is_checked());
        assert!(!FieldValue::text("yes").is_checked());
        assert!(!FieldValue::Bool(false).is_checked());
    }

    #[test]
    fn test_whitespace_text_is_empty() {
        assert!(FieldValue::text("   ").is_empty());
        assert!(!FieldValue::text(" a ").is_empty());
    }

    #[test]
    fn test_signature_payload_strips_data_url_header() {
        let entry = SignatureEntry::new("applicantSignature", "data:image/png;base64,iVBORw0K");
        assert_eq!(entry.payload(), Some("iVBORw0K"));

        let bare = SignatureEntry::new("applicantSignature", "iVBORw0K");
        assert_eq!(bare.payload(), Some("iVBORw0K"));

        let empty = SignatureEntry::new("applicantSignature", "data:image/png;base64,");
        assert_eq!(empty.payload(), None);

        let missing = SignatureEntry {
            key: "applicantSignature".to_string(),
            data_url: None,
        };
        assert_eq!(missing.payload(), None);
    }
}
