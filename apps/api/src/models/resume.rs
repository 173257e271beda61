use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted resume: document plus template/theme metadata.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: String,
    pub title: String,
    pub theme_color: String,
    pub data: Value,
    pub is_primary: bool,
    pub tags: Vec<String>,
    pub word_count: i32,
    pub download_count: i32,
    pub s3_pdf_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing projection of a resume (no document body).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeSummaryRow {
    pub id: Uuid,
    pub template_id: String,
    pub title: String,
    pub theme_color: String,
    pub is_primary: bool,
    pub word_count: i32,
    pub updated_at: DateTime<Utc>,
}

/// Append-only snapshot of a resume document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeVersionRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub version: i32,
    pub data: Value,
    pub template_id: String,
    pub theme_color: String,
    pub change_description: Option<String>,
    pub created_at: DateTime<Utc>,
}
