//! PDF export: an external renderer turns resume HTML into a PDF, which is then
//! archived to object storage.
//!
//! Failures are returned as-is. Nothing here retries; the client re-invokes
//! the export action.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

const RENDER_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("PDF renderer returned status {status}: {message}")]
    Renderer { status: u16, message: String },

    #[error("PDF renderer returned an empty document")]
    EmptyDocument,

    #[error("Archive upload failed: {0}")]
    Archive(String),
}

/// Everything the renderer needs to produce one PDF.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfRequest {
    pub template_id: String,
    pub theme_color: String,
    pub html: String,
    pub filename: String,
    pub data: Value,
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, request: &PdfRequest) -> Result<Bytes, ExportError>;
}

/// Posts the request as JSON to the configured renderer and returns the raw PDF body.
#[derive(Clone)]
pub struct HttpPdfRenderer {
    client: Client,
    url: String,
}

impl HttpPdfRenderer {
    pub fn new(url: impl Into<String>) -> Result<Self, ExportError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(RENDER_TIMEOUT_SECS))
                .build()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(&self, request: &PdfRequest) -> Result<Bytes, ExportError> {
        let response = self
            .client
            .post(&self.url)
            .header("accept", "application/pdf")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExportError::Renderer {
                status: status.as_u16(),
                message,
            });
        }

        let pdf = response.bytes().await?;
        if pdf.is_empty() {
            return Err(ExportError::EmptyDocument);
        }

        debug!("Rendered {} ({} bytes)", request.filename, pdf.len());
        Ok(pdf)
    }
}

/// Long-term storage for exported documents. Returns the key the PDF was stored under.
#[async_trait]
pub trait ExportArchive: Send + Sync {
    async fn store(&self, user_id: Uuid, resume_id: Uuid, pdf: Bytes)
        -> Result<String, ExportError>;
}

pub struct S3Archive {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Archive {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ExportArchive for S3Archive {
    async fn store(
        &self,
        user_id: Uuid,
        resume_id: Uuid,
        pdf: Bytes,
    ) -> Result<String, ExportError> {
        let key = archive_key(user_id, resume_id);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(pdf))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| ExportError::Archive(e.to_string()))?;

        info!("Uploaded export to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}

pub fn archive_key(user_id: Uuid, resume_id: Uuid) -> String {
    format!(
        "exports/{}/{}/{}.pdf",
        user_id,
        resume_id,
        Utc::now().format("%Y%m%dT%H%M%S%3fZ")
    )
}

/// `Jane Doe` becomes `Jane_Doe_Resume.pdf`; a blank name gives `resume_Resume.pdf`.
pub fn pdf_filename(full_name: &str) -> String {
    let stem = full_name.split_whitespace().collect::<Vec<_>>().join("_");
    let stem = if stem.is_empty() { "resume".to_string() } else { stem };
    format!("{stem}_Resume.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_filename() {
        assert_eq!(pdf_filename("Jane  Q Doe"), "Jane_Q_Doe_Resume.pdf");
        assert_eq!(pdf_filename("   "), "resume_Resume.pdf");
    }

    #[test]
    fn test_archive_key_layout() {
        let user = Uuid::new_v4();
        let resume = Uuid::new_v4();
        let key = archive_key(user, resume);
        assert!(key.starts_with(&format!("exports/{user}/{resume}/")));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = PdfRequest {
            template_id: "modern-timeline".into(),
            theme_color: "#2563eb".into(),
            html: "<html></html>".into(),
            filename: pdf_filename("Ada"),
            data: serde_json::json!({}),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["templateId"], "modern-timeline");
        assert_eq!(value["themeColor"], "#2563eb");
        assert_eq!(value["filename"], "Ada_Resume.pdf");
    }
}
