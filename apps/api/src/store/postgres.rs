use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres};
use tracing::info;
use uuid::Uuid;

use crate::models::resume::{ResumeRow, ResumeSummaryRow, ResumeVersionRow};
use crate::store::{
    restore_note, word_count_of, CreateResumeOptions, ResumeDetails, ResumeStore, StoreError,
    INITIAL_VERSION_NOTE,
};

const RESUME_COLUMNS: &str = "id, user_id, template_id, title, theme_color, data, is_primary, \
     tags, word_count, download_count, s3_pdf_key, created_at, updated_at";

/// Postgres-backed store. Resumes live in `resumes`; every snapshot is an
/// append-only row in `resume_versions`.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Copies the current state of a resume into the next version row.
/// Returns `None` when the resume does not exist.
async fn insert_version<'e, E>(
    executor: E,
    resume_id: Uuid,
    change_description: Option<&str>,
) -> Result<Option<ResumeVersionRow>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, ResumeVersionRow>(
        r#"
        INSERT INTO resume_versions
            (id, resume_id, version, data, template_id, theme_color, change_description)
        SELECT $1, r.id,
               COALESCE((SELECT MAX(v.version) FROM resume_versions v WHERE v.resume_id = r.id), 0) + 1,
               r.data, r.template_id, r.theme_color, $3
        FROM resumes r
        WHERE r.id = $2
        RETURNING id, resume_id, version, data, template_id, theme_color,
                  change_description, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(change_description)
    .fetch_optional(executor)
    .await
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn get(&self, id: Uuid) -> Result<ResumeRow, StoreError> {
        let sql = format!("SELECT {RESUME_COLUMNS} FROM resumes WHERE id = $1");
        sqlx::query_as::<_, ResumeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummaryRow>, StoreError> {
        let rows = sqlx::query_as::<_, ResumeSummaryRow>(
            r#"
            SELECT id, template_id, title, theme_color, is_primary, word_count, updated_at
            FROM resumes
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create(
        &self,
        user_id: Uuid,
        template_id: &str,
        data: &Value,
        options: CreateResumeOptions,
    ) -> Result<ResumeRow, StoreError> {
        let id = Uuid::new_v4();
        let sql = format!(
            r#"
            INSERT INTO resumes
                (id, user_id, template_id, title, theme_color, data, is_primary, tags, word_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RESUME_COLUMNS}
            "#
        );

        let mut tx = self.pool.begin().await?;
        if options.is_primary {
            sqlx::query("UPDATE resumes SET is_primary = FALSE WHERE user_id = $1 AND is_primary")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        let row = sqlx::query_as::<_, ResumeRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(template_id)
            .bind(options.title_or_default())
            .bind(options.theme_color_or_default())
            .bind(data)
            .bind(options.is_primary)
            .bind(&options.tags)
            .bind(word_count_of(data))
            .fetch_one(&mut *tx)
            .await?;
        insert_version(&mut *tx, id, Some(INITIAL_VERSION_NOTE)).await?;
        tx.commit().await?;

        info!("Created resume {id} for user {user_id} with template {template_id}");
        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        template_id: &str,
        data: &Value,
        theme_color: Option<&str>,
    ) -> Result<ResumeRow, StoreError> {
        let sql = format!(
            r#"
            UPDATE resumes
            SET template_id = $2,
                data = $3,
                theme_color = COALESCE($4, theme_color),
                word_count = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RESUME_COLUMNS}
            "#
        );
        sqlx::query_as::<_, ResumeRow>(&sql)
            .bind(id)
            .bind(template_id)
            .bind(data)
            .bind(theme_color)
            .bind(word_count_of(data))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_details(
        &self,
        id: Uuid,
        details: &ResumeDetails,
    ) -> Result<ResumeRow, StoreError> {
        let mut tx = self.pool.begin().await?;
        if details.is_primary == Some(true) {
            sqlx::query(
                r#"
                UPDATE resumes
                SET is_primary = FALSE
                WHERE user_id = (SELECT user_id FROM resumes WHERE id = $1)
                  AND id <> $1
                  AND is_primary
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let sql = format!(
            r#"
            UPDATE resumes
            SET title = COALESCE($2, title),
                tags = COALESCE($3, tags),
                is_primary = COALESCE($4, is_primary),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RESUME_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ResumeRow>(&sql)
            .bind(id)
            .bind(details.title())
            .bind(details.tags.clone())
            .bind(details.is_primary)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        tx.commit().await?;

        info!("Updated details of resume {id}");
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        info!("Deleted resume {id}");
        Ok(())
    }

    async fn create_version(
        &self,
        resume_id: Uuid,
        change_description: Option<&str>,
    ) -> Result<ResumeVersionRow, StoreError> {
        let version = insert_version(&self.pool, resume_id, change_description)
            .await?
            .ok_or(StoreError::NotFound(resume_id))?;

        info!("Recorded resume {resume_id} version {}", version.version);
        Ok(version)
    }

    async fn versions(&self, resume_id: Uuid) -> Result<Vec<ResumeVersionRow>, StoreError> {
        let rows = sqlx::query_as::<_, ResumeVersionRow>(
            r#"
            SELECT id, resume_id, version, data, template_id, theme_color,
                   change_description, created_at
            FROM resume_versions
            WHERE resume_id = $1
            ORDER BY version DESC
            "#,
        )
        .bind(resume_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn restore_version(
        &self,
        resume_id: Uuid,
        version: i32,
    ) -> Result<ResumeRow, StoreError> {
        let mut tx = self.pool.begin().await?;

        let snapshot = sqlx::query_as::<_, ResumeVersionRow>(
            r#"
            SELECT id, resume_id, version, data, template_id, theme_color,
                   change_description, created_at
            FROM resume_versions
            WHERE resume_id = $1 AND version = $2
            "#,
        )
        .bind(resume_id)
        .bind(version)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::VersionNotFound { resume_id, version })?;

        let sql = format!(
            r#"
            UPDATE resumes
            SET data = $2, template_id = $3, theme_color = $4, word_count = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {RESUME_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ResumeRow>(&sql)
            .bind(resume_id)
            .bind(&snapshot.data)
            .bind(&snapshot.template_id)
            .bind(&snapshot.theme_color)
            .bind(word_count_of(&snapshot.data))
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound(resume_id))?;

        insert_version(&mut *tx, resume_id, Some(&restore_note(version))).await?;
        tx.commit().await?;

        info!("Restored resume {resume_id} to version {version}");
        Ok(row)
    }

    async fn record_export(&self, id: Uuid, s3_key: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET s3_pdf_key = $2, download_count = download_count + 1
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(s3_key)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }
}
