//! Page rendering seam for overlay discovery

use std::sync::Arc;

use async_trait::async_trait;
use lopdf::{Document, ObjectId};
use tracing::debug;

use super::extract::{page_widgets, project_widgets, AnnotationField, WidgetAnnotation};
use super::viewport::Viewport;
use crate::error::TitlePdfError;
use crate::objects::{page_box, page_rotation};

/// A page as the renderer produced it
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page_index: usize,
    pub viewport: Viewport,
    pub widgets: Vec<WidgetAnnotation>,
}

impl RenderedPage {
    /// Overlay fields in this page's device space
    pub fn fields(&self) -> Vec<AnnotationField> {
        project_widgets(self.page_index, &self.viewport, &self.widgets)
    }
}

/// Something that can render a page and report its widget annotations.
///
/// `rotation` overrides the page's own `/Rotate` when given.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn render_page(
        &self,
        page_index: usize,
        scale: f64,
        rotation: Option<i64>,
    ) -> Result<RenderedPage, TitlePdfError>;

    fn page_count(&self) -> usize;
}

/// Reads geometry straight from a parsed document; rasterizing pixels is
/// left to the caller's renderer.
#[derive(Debug, Clone)]
pub struct LopdfPageSource {
    doc: Arc<Document>,
    pages: Vec<ObjectId>,
}

impl LopdfPageSource {
    pub fn new(doc: Document) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            doc: Arc::new(doc),
            pages,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TitlePdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| TitlePdfError::TemplateLoad(e.to_string()))?;
        Ok(Self::new(doc))
    }
}

#[async_trait]
impl PageSource for LopdfPageSource {
    async fn render_page(
        &self,
        page_index: usize,
        scale: f64,
        rotation: Option<i64>,
    ) -> Result<RenderedPage, TitlePdfError> {
        let page_id = *self.pages.get(page_index).ok_or_else(|| {
            TitlePdfError::Operation(format!(
                "Page {} out of range (document has {} pages)",
                page_index,
                self.pages.len()
            ))
        })?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(TitlePdfError::Operation(format!("Invalid scale {}", scale)));
        }

        let rotation = rotation.unwrap_or_else(|| page_rotation(&self.doc, page_id));
        let viewport = Viewport::new(page_box(&self.doc, page_id), scale, rotation);
        let widgets = page_widgets(&self.doc, page_id);
        debug!(page_index, widgets = widgets.len(), "Rendered page geometry");

        Ok(RenderedPage {
            page_index,
            viewport,
            widgets,
        })
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, FixtureField};
    use pretty_assertions::assert_eq;

    fn source() -> LopdfPageSource {
        LopdfPageSource::from_bytes(&fixtures::template(&[
            FixtureField::text("txtMake", 0, [72.0, 600.0, 272.0, 618.0]),
            FixtureField::checkbox("chkLien", 1, [72.0, 650.0, 84.0, 662.0]),
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn test_renders_page_geometry() {
        let source = source();
        assert_eq!(source.page_count(), 2);

        let page = source.render_page(1, 1.0, None).await.unwrap();
        assert_eq!(page.viewport.rotation, 0);
        assert_eq!((page.viewport.width, page.viewport.height), (612.0, 792.0));

        let fields = page.fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].id, "chkLien");
        assert_eq!((fields[0].x, fields[0].y), (72.0, 130.0));
    }

    #[tokio::test]
    async fn test_rotation_override() {
        let page = source().render_page(0, 1.0, Some(90)).await.unwrap();
        assert_eq!((page.viewport.width, page.viewport.height), (792.0, 612.0));
    }

    #[tokio::test]
    async fn test_out_of_range_page() {
        let err = source().render_page(5, 1.0, None).await.unwrap_err();
        assert!(matches!(err, TitlePdfError::Operation(_)));
    }

    #[test]
    fn test_non_pdf_bytes_rejected() {
        assert!(matches!(
            LopdfPageSource::from_bytes(b"not a pdf"),
            Err(TitlePdfError::TemplateLoad(_))
        ));
    }
}
