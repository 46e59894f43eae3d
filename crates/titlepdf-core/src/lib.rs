//! Title PDF assembly
//!
//! Resolves logical field keys against an AcroForm template, fills text and
//! checkbox fields, draws captured signatures at fixed placements and
//! flattens the result using lopdf.
//!
//! The [`annotations`] module is a separate path that discovers a page's own
//! widget annotations and projects them into device space for an overlay.

pub mod annotations;
pub mod appearance;
pub mod assemble;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fill;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
pub mod flatten;
pub mod geometry;
pub mod objects;
pub mod overlay_content;
pub mod placements;
pub mod resolver;
pub mod signature;
pub mod template;

pub use annotations::{
    merge_defaults, AnnotationField, AnnotationKind, Discovery, LopdfPageSource, OverlaySession, PageSource,
    RenderedPage, Viewport,
};
pub use assemble::{assemble, AssembledDocument, DocumentAssembler};
pub use config::{AssemblerConfig, DEFAULT_MAX_TEXT_LEN};
pub use diagnostics::Diagnostic;
pub use error::TitlePdfError;
pub use geometry::{fit_within, PdfRect};
pub use placements::{title_placements, PlacementRegistry, SignaturePlacement};
pub use resolver::{resolve, TargetField};
pub use template::{FieldType, PdfTemplate, TemplateField};
