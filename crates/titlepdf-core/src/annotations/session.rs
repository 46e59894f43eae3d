//! Cancellable overlay discovery
//!
//! A session holds the geometry published for each page and the values the
//! overlay edits. Every render gets its own [`CancellationToken`]; starting a
//! new render cancels the previous one, and a cancelled render never
//! publishes geometry or touches values.

use std::collections::BTreeMap;

use shared_types::{FieldValue, FormState};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::extract::AnnotationField;
use super::merge::merge_defaults;
use super::source::{PageSource, RenderedPage};
use crate::error::TitlePdfError;

/// Outcome of a discovery pass
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    /// The render was superseded or abandoned; nothing changed
    Cancelled,
    /// Fields now published for the page
    Published(Vec<AnnotationField>),
}

#[derive(Debug, Default)]
pub struct OverlaySession {
    geometry: BTreeMap<usize, Vec<AnnotationField>>,
    values: FormState,
    current: Option<CancellationToken>,
}

impl OverlaySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from values captured elsewhere (e.g. OCR)
    pub fn with_values(values: FormState) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Cancel any in-flight render and hand out a token for the next one
    pub fn begin_render(&mut self) -> CancellationToken {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        token
    }

    /// Abandon the in-flight render, if any
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    /// Render `page_index` and publish its fields unless `token` is
    /// cancelled first. Cancellation is reported as [`Discovery::Cancelled`],
    /// never as an error.
    pub async fn discover<S>(
        &mut self,
        source: &S,
        page_index: usize,
        scale: f64,
        rotation: Option<i64>,
        token: CancellationToken,
    ) -> Result<Discovery, TitlePdfError>
    where
        S: PageSource + ?Sized,
    {
        match render_cancellable(source, page_index, scale, rotation, &token).await? {
            Some(page) => Ok(self.publish(page, &token)),
            None => Ok(Discovery::Cancelled),
        }
    }

    /// Publish a finished render if its token is still live
    pub fn publish(&mut self, page: RenderedPage, token: &CancellationToken) -> Discovery {
        if token.is_cancelled() {
            debug!(page_index = page.page_index, "Discarding cancelled render");
            return Discovery::Cancelled;
        }
        let fields = page.fields();
        self.values = merge_defaults(&self.values, &fields);
        self.geometry.insert(page.page_index, fields.clone());
        debug!(page_index = page.page_index, fields = fields.len(), "Published overlay fields");
        Discovery::Published(fields)
    }

    pub fn fields(&self, page_index: usize) -> Option<&[AnnotationField]> {
        self.geometry.get(&page_index).map(Vec::as_slice)
    }

    pub fn values(&self) -> &FormState {
        &self.values
    }

    /// Record a user edit
    pub fn set_value(&mut self, id: &str, value: impl Into<FieldValue>) {
        self.values.insert(id.to_string(), value.into());
    }
}

/// Race a page render against `token`; `None` when cancellation wins
pub async fn render_cancellable<S>(
    source: &S,
    page_index: usize,
    scale: f64,
    rotation: Option<i64>,
    token: &CancellationToken,
) -> Result<Option<RenderedPage>, TitlePdfError>
where
    S: PageSource + ?Sized,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Ok(None),
        page = source.render_page(page_index, scale, rotation) => page.map(Some),
    }
}
