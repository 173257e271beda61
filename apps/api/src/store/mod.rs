//! Persistence of resumes and their version history.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::{ResumeRow, ResumeSummaryRow, ResumeVersionRow};
use crate::render::catalog::DEFAULT_THEME_COLOR;

pub use memory::MemoryResumeStore;
pub use postgres::PgResumeStore;

pub const INITIAL_VERSION_NOTE: &str = "Initial version";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Resume {0} not found")]
    NotFound(Uuid),

    #[error("Version {version} of resume {resume_id} not found")]
    VersionNotFound { resume_id: Uuid, version: i32 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Optional metadata supplied when a resume is first persisted.
#[derive(Debug, Clone, Default)]
pub struct CreateResumeOptions {
    pub title: Option<String>,
    pub theme_color: Option<String>,
    pub tags: Vec<String>,
    pub is_primary: bool,
}

impl CreateResumeOptions {
    pub fn title_or_default(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Resume - {}", chrono::Utc::now().format("%Y-%m-%d")),
        }
    }

    pub fn theme_color_or_default(&self) -> String {
        self.theme_color
            .clone()
            .unwrap_or_else(|| DEFAULT_THEME_COLOR.to_string())
    }
}

/// Metadata changes for an existing resume. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct ResumeDetails {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_primary: Option<bool>,
}

impl ResumeDetails {
    pub fn is_empty(&self) -> bool {
        self.title().is_none() && self.tags.is_none() && self.is_primary.is_none()
    }

    /// Trimmed title; blank titles count as unset.
    pub fn title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }
}

/// Backend for resume documents.
///
/// `create` always writes version 1 with [`INITIAL_VERSION_NOTE`]; versions are
/// append-only and numbered contiguously per resume. A user has at most one
/// primary resume: marking one primary clears the flag on the others.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<ResumeRow, StoreError>;

    /// Most recently updated first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummaryRow>, StoreError>;

    async fn create(
        &self,
        user_id: Uuid,
        template_id: &str,
        data: &Value,
        options: CreateResumeOptions,
    ) -> Result<ResumeRow, StoreError>;

    async fn update(
        &self,
        id: Uuid,
        template_id: &str,
        data: &Value,
        theme_color: Option<&str>,
    ) -> Result<ResumeRow, StoreError>;

    async fn update_details(&self, id: Uuid, details: &ResumeDetails)
        -> Result<ResumeRow, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Copies template, theme and tags into a new resume titled `"<title> (Copy)"`.
    async fn duplicate(&self, id: Uuid) -> Result<ResumeRow, StoreError> {
        let source = self.get(id).await?;
        let options = CreateResumeOptions {
            title: Some(format!("{} (Copy)", source.title)),
            theme_color: Some(source.theme_color.clone()),
            tags: source.tags.clone(),
            is_primary: false,
        };
        self.create(source.user_id, &source.template_id, &source.data, options)
            .await
    }

    async fn create_version(
        &self,
        resume_id: Uuid,
        change_description: Option<&str>,
    ) -> Result<ResumeVersionRow, StoreError>;

    /// Newest first.
    async fn versions(&self, resume_id: Uuid) -> Result<Vec<ResumeVersionRow>, StoreError>;

    /// Writes the snapshot back onto the resume and records the restore as a new version.
    async fn restore_version(&self, resume_id: Uuid, version: i32)
        -> Result<ResumeRow, StoreError>;

    /// Stores the archive key of the latest export and bumps the download count.
    async fn record_export(&self, id: Uuid, s3_key: &str) -> Result<(), StoreError>;
}

pub(crate) fn word_count_of(data: &Value) -> i32 {
    i32::try_from(crate::models::document::word_count(data)).unwrap_or(i32::MAX)
}

pub(crate) fn restore_note(version: i32) -> String {
    format!("Restored from version {version}")
}
