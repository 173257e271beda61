use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::resume::{ResumeRow, ResumeSummaryRow, ResumeVersionRow};
use crate::store::{
    restore_note, word_count_of, CreateResumeOptions, ResumeDetails, ResumeStore, StoreError,
    INITIAL_VERSION_NOTE,
};

#[derive(Default)]
struct Inner {
    resumes: HashMap<Uuid, ResumeRow>,
    versions: HashMap<Uuid, Vec<ResumeVersionRow>>,
}

impl Inner {
    fn snapshot(
        &mut self,
        resume_id: Uuid,
        change_description: Option<&str>,
    ) -> Result<ResumeVersionRow, StoreError> {
        let resume = self
            .resumes
            .get(&resume_id)
            .ok_or(StoreError::NotFound(resume_id))?;
        let history = self.versions.entry(resume_id).or_default();
        let version = ResumeVersionRow {
            id: Uuid::new_v4(),
            resume_id,
            version: history.len() as i32 + 1,
            data: resume.data.clone(),
            template_id: resume.template_id.clone(),
            theme_color: resume.theme_color.clone(),
            change_description: change_description.map(str::to_string),
            created_at: Utc::now(),
        };
        history.push(version.clone());
        Ok(version)
    }

    fn clear_primary(&mut self, user_id: Uuid, except: Option<Uuid>) {
        self.resumes
            .values_mut()
            .filter(|r| r.user_id == user_id && Some(r.id) != except)
            .for_each(|r| r.is_primary = false);
    }
}

/// In-process store for local runs and tests.
#[derive(Default)]
pub struct MemoryResumeStore {
    inner: RwLock<Inner>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn get(&self, id: Uuid) -> Result<ResumeRow, StoreError> {
        self.inner
            .read()
            .await
            .resumes
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummaryRow>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<ResumeSummaryRow> = inner
            .resumes
            .values()
            .filter(|r| r.user_id == user_id)
            .map(|r| ResumeSummaryRow {
                id: r.id,
                template_id: r.template_id.clone(),
                title: r.title.clone(),
                theme_color: r.theme_color.clone(),
                is_primary: r.is_primary,
                word_count: r.word_count,
                updated_at: r.updated_at,
            })
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn create(
        &self,
        user_id: Uuid,
        template_id: &str,
        data: &Value,
        options: CreateResumeOptions,
    ) -> Result<ResumeRow, StoreError> {
        let now = Utc::now();
        let row = ResumeRow {
            id: Uuid::new_v4(),
            user_id,
            template_id: template_id.to_string(),
            title: options.title_or_default(),
            theme_color: options.theme_color_or_default(),
            data: data.clone(),
            is_primary: options.is_primary,
            tags: options.tags,
            word_count: word_count_of(data),
            download_count: 0,
            s3_pdf_key: None,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        if row.is_primary {
            inner.clear_primary(user_id, None);
        }
        inner.resumes.insert(row.id, row.clone());
        inner.snapshot(row.id, Some(INITIAL_VERSION_NOTE))?;
        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        template_id: &str,
        data: &Value,
        theme_color: Option<&str>,
    ) -> Result<ResumeRow, StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner.resumes.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        row.template_id = template_id.to_string();
        row.data = data.clone();
        if let Some(color) = theme_color {
            row.theme_color = color.to_string();
        }
        row.word_count = word_count_of(data);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn update_details(
        &self,
        id: Uuid,
        details: &ResumeDetails,
    ) -> Result<ResumeRow, StoreError> {
        let mut inner = self.inner.write().await;
        let user_id = inner
            .resumes
            .get(&id)
            .map(|r| r.user_id)
            .ok_or(StoreError::NotFound(id))?;
        if details.is_primary == Some(true) {
            inner.clear_primary(user_id, Some(id));
        }

        let row = inner.resumes.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = details.title() {
            row.title = title.to_string();
        }
        if let Some(tags) = &details.tags {
            row.tags = tags.clone();
        }
        if let Some(is_primary) = details.is_primary {
            row.is_primary = is_primary;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.resumes.remove(&id).ok_or(StoreError::NotFound(id))?;
        inner.versions.remove(&id);
        Ok(())
    }

    async fn create_version(
        &self,
        resume_id: Uuid,
        change_description: Option<&str>,
    ) -> Result<ResumeVersionRow, StoreError> {
        self.inner
            .write()
            .await
            .snapshot(resume_id, change_description)
    }

    async fn versions(&self, resume_id: Uuid) -> Result<Vec<ResumeVersionRow>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows = inner.versions.get(&resume_id).cloned().unwrap_or_default();
        rows.reverse();
        Ok(rows)
    }

    async fn restore_version(
        &self,
        resume_id: Uuid,
        version: i32,
    ) -> Result<ResumeRow, StoreError> {
        let mut inner = self.inner.write().await;
        let snapshot = inner
            .versions
            .get(&resume_id)
            .and_then(|history| history.iter().find(|v| v.version == version))
            .cloned()
            .ok_or(StoreError::VersionNotFound { resume_id, version })?;

        let row = inner
            .resumes
            .get_mut(&resume_id)
            .ok_or(StoreError::NotFound(resume_id))?;
        row.word_count = word_count_of(&snapshot.data);
        row.data = snapshot.data;
        row.template_id = snapshot.template_id;
        row.theme_color = snapshot.theme_color;
        row.updated_at = Utc::now();
        let row = row.clone();

        inner.snapshot(resume_id, Some(&restore_note(version)))?;
        Ok(row)
    }

    async fn record_export(&self, id: Uuid, s3_key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner.resumes.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        row.s3_pdf_key = Some(s3_key.to_string());
        row.download_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "personalInfo": { "fullName": "Ada Lovelace", "summary": "Analyst of engines" },
            "experience": [],
            "sections": []
        })
    }

    #[tokio::test]
    async fn test_create_writes_initial_version() {
        let store = MemoryResumeStore::new();
        let row = store
            .create(Uuid::new_v4(), "modern-timeline", &sample(), Default::default())
            .await
            .unwrap();

        assert_eq!(row.theme_color, "#2563eb");
        assert!(row.title.starts_with("Resume - "));
        assert!(row.word_count > 0);

        let versions = store.versions(row.id).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[0].change_description.as_deref(), Some(INITIAL_VERSION_NOTE));
    }

    #[tokio::test]
    async fn test_duplicate_copies_metadata() {
        let store = MemoryResumeStore::new();
        let user = Uuid::new_v4();
        let original = store
            .create(
                user,
                "creative-cards",
                &sample(),
                CreateResumeOptions {
                    title: Some("Backend".into()),
                    theme_color: Some("#ff0000".into()),
                    tags: vec!["rust".into()],
                    is_primary: true,
                },
            )
            .await
            .unwrap();

        let copy = store.duplicate(original.id).await.unwrap();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.title, "Backend (Copy)");
        assert_eq!(copy.template_id, "creative-cards");
        assert_eq!(copy.theme_color, "#ff0000");
        assert_eq!(copy.tags, vec!["rust".to_string()]);
        assert!(!copy.is_primary);
        assert_eq!(copy.data, original.data);
        assert_eq!(store.list(user).await.unwrap().len(), 2);
        assert_eq!(store.versions(copy.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_versions_are_contiguous_and_restorable() {
        let store = MemoryResumeStore::new();
        let row = store
            .create(Uuid::new_v4(), "professional-classic", &sample(), Default::default())
            .await
            .unwrap();

        let edited = json!({ "personalInfo": { "fullName": "Grace Hopper" }, "sections": [] });
        store
            .update(row.id, "compact-minimal", &edited, Some("#000000"))
            .await
            .unwrap();
        let v2 = store.create_version(row.id, Some("renamed")).await.unwrap();
        assert_eq!(v2.version, 2);

        let restored = store.restore_version(row.id, 1).await.unwrap();
        assert_eq!(restored.data, sample());
        assert_eq!(restored.template_id, "professional-classic");
        assert_eq!(restored.theme_color, "#2563eb");

        let numbers: Vec<i32> = store
            .versions(row.id)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(numbers, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let store = MemoryResumeStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.get(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.record_export(id, "k").await,
            Err(StoreError::NotFound(_))
        ));

        let row = store
            .create(Uuid::new_v4(), "professional-classic", &sample(), Default::default())
            .await
            .unwrap();
        assert!(matches!(
            store.restore_version(row.id, 9).await,
            Err(StoreError::VersionNotFound { version: 9, .. })
        ));
    }

    #[tokio::test]
    async fn test_primary_is_exclusive_per_user() {
        let store = MemoryResumeStore::new();
        let user = Uuid::new_v4();
        let primary = CreateResumeOptions {
            is_primary: true,
            ..Default::default()
        };
        let first = store
            .create(user, "professional-classic", &sample(), primary.clone())
            .await
            .unwrap();
        let other_user = store
            .create(Uuid::new_v4(), "professional-classic", &sample(), primary.clone())
            .await
            .unwrap();
        let second = store
            .create(user, "professional-classic", &sample(), primary)
            .await
            .unwrap();
        assert!(!store.get(first.id).await.unwrap().is_primary);
        assert!(store.get(second.id).await.unwrap().is_primary);

        let details = ResumeDetails {
            title: Some("  Platform  ".into()),
            tags: Some(vec!["rust".into()]),
            is_primary: Some(true),
        };
        let updated = store.update_details(first.id, &details).await.unwrap();
        assert_eq!(updated.title, "Platform");
        assert_eq!(updated.tags, vec!["rust".to_string()]);
        assert!(updated.is_primary);
        assert!(!store.get(second.id).await.unwrap().is_primary);
        assert!(store.get(other_user.id).await.unwrap().is_primary);

        let blank = ResumeDetails {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert!(blank.is_empty());
        let unchanged = store.update_details(first.id, &blank).await.unwrap();
        assert_eq!(unchanged.title, "Platform");
        assert!(matches!(
            store.update_details(Uuid::new_v4(), &details).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_record_export_counts_downloads() {
        let store = MemoryResumeStore::new();
        let row = store
            .create(Uuid::new_v4(), "professional-classic", &sample(), Default::default())
            .await
            .unwrap();
        store.record_export(row.id, "exports/a.pdf").await.unwrap();
        store.record_export(row.id, "exports/b.pdf").await.unwrap();

        let row = store.get(row.id).await.unwrap();
        assert_eq!(row.download_count, 2);
        assert_eq!(row.s3_pdf_key.as_deref(), Some("exports/b.pdf"));
    }
}
