use thiserror::Error;

/// Problems found while building a [`crate::FieldRegistry`]
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Duplicate field id: {0}")]
    DuplicateField(String),

    #[error("Sections do not partition the field list: {0}")]
    SectionLayout(String),

    #[error("Field {field} references unknown field {reference}")]
    UnknownReference { field: String, reference: String },

    #[error("Invalid pattern on field {field}: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("Group {group:?} has more than one anchor ({first}, {second})")]
    DuplicateAnchor {
        group: Vec<String>,
        first: String,
        second: String,
    },

    #[error("Registry JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by the form controller
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),
}
