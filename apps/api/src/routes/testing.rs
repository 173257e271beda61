use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use bytes::Bytes;
use serde_json::Value;
use uuid::Uuid;

use crate::editor::SessionRegistry;
use crate::export::{archive_key, ExportArchive, ExportError, PdfRenderer, PdfRequest};
use crate::render::{ResumeRenderer, TemplateCatalog};
use crate::state::AppState;
use crate::store::MemoryResumeStore;

/// Answers every request with a tiny fixed PDF.
pub struct StaticPdf;

#[async_trait]
impl PdfRenderer for StaticPdf {
    async fn render(&self, request: &PdfRequest) -> Result<Bytes, ExportError> {
        assert!(request.html.contains("<html"));
        Ok(Bytes::from_static(b"%PDF-1.7\n%%EOF\n"))
    }
}

#[derive(Default)]
pub struct RecordingArchive {
    pub keys: Mutex<Vec<String>>,
}

#[async_trait]
impl ExportArchive for RecordingArchive {
    async fn store(
        &self,
        user_id: Uuid,
        resume_id: Uuid,
        _pdf: Bytes,
    ) -> Result<String, ExportError> {
        let key = archive_key(user_id, resume_id);
        if let Ok(mut keys) = self.keys.lock() {
            keys.push(key.clone());
        }
        Ok(key)
    }
}

pub fn test_state() -> AppState {
    AppState {
        store: Arc::new(MemoryResumeStore::new()),
        sessions: Arc::new(SessionRegistry::new()),
        renderer: Arc::new(ResumeRenderer::new().unwrap()),
        catalog: Arc::new(TemplateCatalog::builtin()),
        pdf: Arc::new(StaticPdf),
        archive: Arc::new(RecordingArchive::default()),
    }
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
