use thiserror::Error;

#[derive(Error, Debug)]
pub enum TitlePdfError {
    #[error("Failed to load template: {0}")]
    TemplateLoad(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TitlePdfError {
    pub(crate) fn operation<E: std::fmt::Display>(e: E) -> Self {
        TitlePdfError::Operation(e.to_string())
    }
}
