use std::sync::Arc;

use crate::editor::SessionRegistry;
use crate::export::{ExportArchive, PdfRenderer};
use crate::render::{ResumeRenderer, TemplateCatalog};
use crate::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResumeStore>,
    pub sessions: Arc<SessionRegistry>,
    pub renderer: Arc<ResumeRenderer>,
    pub catalog: Arc<TemplateCatalog>,
    /// External HTML to PDF service.
    pub pdf: Arc<dyn PdfRenderer>,
    /// Where exported PDFs are kept. S3 in production.
    pub archive: Arc<dyn ExportArchive>,
}
