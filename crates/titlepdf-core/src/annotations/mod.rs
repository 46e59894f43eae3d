//! Overlay field discovery from a page's own widget annotations

pub mod extract;
pub mod merge;
pub mod session;
pub mod source;
pub mod viewport;

pub use extract::{page_widgets, project_widgets, AnnotationField, AnnotationKind, WidgetAnnotation};
pub use merge::merge_defaults;
pub use session::{render_cancellable, Discovery, OverlaySession};
pub use source::{LopdfPageSource, PageSource, RenderedPage};
pub use viewport::{DeviceRect, Viewport};
