use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::{analyze, AtsReport};
use crate::editor::{Action, EditOutcome, EditSession, FieldEdit, SessionHandle};
use crate::errors::AppError;
use crate::export::{pdf_filename, PdfRequest};
use crate::models::document::{ResumeData, SectionType};
use crate::models::resume::ResumeRow;
use crate::render::default_document;
use crate::render::style::StyleOptions;
use crate::state::AppState;
use crate::store::{CreateResumeOptions, ResumeDetails};

#[derive(Deserialize)]
pub struct OpenSessionRequest {
    pub template_id: String,
    pub resume_id: Option<Uuid>,
    pub user_id: Uuid,
    pub editable: Option<bool>,
}

#[derive(Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub template_id: String,
    pub resume_id: Option<Uuid>,
    pub editable: bool,
    pub revision: u64,
    pub document: Value,
    pub style: StyleOptions,
}

impl From<&EditSession> for SessionView {
    fn from(session: &EditSession) -> Self {
        SessionView {
            session_id: session.id(),
            template_id: session.template_id().to_string(),
            resume_id: session.resume_id(),
            editable: session.editable(),
            revision: session.revision(),
            document: session.document().as_ref().clone(),
            style: session.style().clone(),
        }
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<SessionHandle>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// POST /api/v1/sessions
/// Loads the persisted resume when `resume_id` is given, otherwise seeds the
/// template's sample document.
pub async fn handle_open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    if !state.catalog.contains(&req.template_id) {
        warn!("Unknown template '{}', using fallback", req.template_id);
    }
    let template = state.catalog.get(&req.template_id);
    let editable = req.editable.unwrap_or(true);

    let session = match req.resume_id {
        Some(resume_id) => {
            let row = state.store.get(resume_id).await?;
            if row.user_id != req.user_id {
                return Err(AppError::NotFound(format!("Resume {resume_id} not found")));
            }
            EditSession::new(req.user_id, &template.id, row.data, editable).with_resume_id(row.id)
        }
        None => EditSession::new(req.user_id, &template.id, default_document(template), editable),
    };

    let view = SessionView::from(&session);
    state.sessions.open(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let session = handle.session.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.close(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

#[derive(Deserialize)]
pub struct FieldEditsRequest {
    pub edits: Vec<FieldEdit>,
}

#[derive(Serialize)]
pub struct EditsResponse {
    pub revision: u64,
    pub outcomes: Vec<EditOutcome>,
}

/// PATCH /api/v1/sessions/:id/fields
/// Edits apply in order. A malformed path is reported as `ignored` and does not
/// stop the rest of the batch.
pub async fn handle_update_fields(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FieldEditsRequest>,
) -> Result<Json<EditsResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.session.lock().await;
    let outcomes = session.apply_batch(req.edits);
    debug!(
        "Session {id}: {}/{} edits applied",
        outcomes.iter().filter(|o| o.is_applied()).count(),
        outcomes.len()
    );
    Ok(Json(EditsResponse {
        revision: session.revision(),
        outcomes,
    }))
}

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub path: String,
    pub item: Value,
}

/// Object entries are addressed by `id`, plain string entries by `index`.
#[derive(Deserialize)]
pub struct RemoveItemRequest {
    pub path: String,
    pub id: Option<String>,
    pub index: Option<usize>,
}

/// POST /api/v1/sessions/:id/items
pub async fn handle_add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<EditOutcome>, AppError> {
    let handle = find_session(&state, id).await?;
    let outcome = handle.session.lock().await.add_item(&req.path, req.item);
    Ok(Json(outcome))
}

/// DELETE /api/v1/sessions/:id/items
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RemoveItemRequest>,
) -> Result<Json<EditOutcome>, AppError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.session.lock().await;
    let outcome = match (req.id.as_deref(), req.index) {
        (Some(item_id), None) => session.remove_item(&req.path, item_id),
        (None, Some(index)) => session.remove_at(&req.path, index),
        _ => {
            return Err(AppError::Validation(
                "Provide exactly one of 'id' or 'index'".to_string(),
            ))
        }
    };
    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct AddSectionRequest {
    pub section_type: String,
    pub variant: Option<String>,
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub active_id: String,
    pub over_id: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateSectionRequest {
    pub enabled: Option<bool>,
    pub title: Option<String>,
}

/// POST /api/v1/sessions/:id/sections
pub async fn handle_add_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddSectionRequest>,
) -> Result<Json<EditOutcome>, AppError> {
    let section_type = req
        .section_type
        .parse::<SectionType>()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let handle = find_session(&state, id).await?;
    let outcome = handle
        .session
        .lock()
        .await
        .add_section(section_type, req.variant.as_deref());
    Ok(Json(outcome))
}

/// POST /api/v1/sessions/:id/sections/reorder
pub async fn handle_reorder_sections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<EditOutcome>, AppError> {
    let handle = find_session(&state, id).await?;
    let outcome = handle
        .session
        .lock()
        .await
        .reorder_sections(&req.active_id, req.over_id.as_deref());
    Ok(Json(outcome))
}

/// DELETE /api/v1/sessions/:id/sections/:section_id
pub async fn handle_delete_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, String)>,
) -> Result<Json<EditOutcome>, AppError> {
    let handle = find_session(&state, id).await?;
    let outcome = handle.session.lock().await.delete_section(&section_id);
    Ok(Json(outcome))
}

/// PATCH /api/v1/sessions/:id/sections/:section_id
pub async fn handle_update_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, String)>,
    Json(req): Json<UpdateSectionRequest>,
) -> Result<Json<EditsResponse>, AppError> {
    if req.enabled.is_none() && req.title.is_none() {
        return Err(AppError::Validation(
            "Provide at least one of 'enabled' or 'title'".to_string(),
        ));
    }
    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Section title cannot be empty".to_string()));
    }

    let handle = find_session(&state, id).await?;
    let mut session = handle.session.lock().await;
    let mut outcomes = Vec::new();
    if let Some(enabled) = req.enabled {
        outcomes.push(session.set_section_enabled(&section_id, enabled));
    }
    if let Some(title) = &req.title {
        outcomes.push(session.rename_section(&section_id, title));
    }

    Ok(Json(EditsResponse {
        revision: session.revision(),
        outcomes,
    }))
}

#[derive(Deserialize)]
pub struct SwitchTemplateRequest {
    pub template_id: String,
}

/// POST /api/v1/sessions/:id/template
/// Opens a new session on the same document with another template. The
/// original session stays open and untouched.
pub async fn handle_switch_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SwitchTemplateRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let handle = find_session(&state, id).await?;
    let template = state.catalog.get(&req.template_id);
    let forked = handle.session.lock().await.switch_template(&template.id);

    let view = SessionView::from(&forked);
    state.sessions.open(forked).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/sessions/:id/style
pub async fn handle_get_style(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StyleOptions>, AppError> {
    let handle = find_session(&state, id).await?;
    let style = handle.session.lock().await.style().clone();
    Ok(Json(style))
}

/// PUT /api/v1/sessions/:id/style
/// Replaces every override; omitted fields go back to their defaults.
pub async fn handle_set_style(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(style): Json<StyleOptions>,
) -> Result<Json<EditOutcome>, AppError> {
    let handle = find_session(&state, id).await?;
    let outcome = handle.session.lock().await.set_style(style);
    Ok(Json(outcome))
}

const CHANGES_WAIT_SECS: u64 = 25;

#[derive(Deserialize)]
pub struct ChangesQuery {
    #[serde(default)]
    pub after: u64,
}

#[derive(Serialize)]
pub struct ChangeView {
    pub revision: u64,
    pub document: Value,
}

/// GET /api/v1/sessions/:id/changes?after=
/// Long-poll for previews: answers as soon as the session's revision passes
/// `after`, or with 204 once the wait times out.
pub async fn handle_wait_for_change(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ChangesQuery>,
) -> Result<Response, AppError> {
    let handle = find_session(&state, id).await?;
    let mut rx = handle.session.lock().await.subscribe();

    let waited = tokio::time::timeout(
        Duration::from_secs(CHANGES_WAIT_SECS),
        rx.wait_for(|snapshot| snapshot.revision > params.after),
    )
    .await;

    match waited {
        Ok(Ok(snapshot)) => Ok(Json(ChangeView {
            revision: snapshot.revision,
            document: snapshot.document.as_ref().clone(),
        })
        .into_response()),
        // Timed out, or the session was closed while waiting.
        Ok(Err(_)) | Err(_) => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[derive(Deserialize)]
pub struct RenderQuery {
    pub editable: Option<bool>,
}

/// GET /api/v1/sessions/:id/render
/// A read-only session never renders edit affordances.
pub async fn handle_render(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<RenderQuery>,
) -> Result<Html<String>, AppError> {
    let handle = find_session(&state, id).await?;
    let (data, template_id, editable, style) = {
        let session = handle.session.lock().await;
        let editable = params.editable.unwrap_or(true) && session.editable();
        (
            session.data(),
            session.template_id().to_string(),
            editable,
            session.style().clone(),
        )
    };

    let template = state.catalog.get(&template_id);
    let html = state.renderer.render(template, &data, None, editable, &style)?;
    Ok(Html(html))
}

/// GET /api/v1/sessions/:id/ats
pub async fn handle_ats_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AtsReport>, AppError> {
    let handle = find_session(&state, id).await?;
    let session = handle.session.lock().await;
    Ok(Json(analyze(&session.data(), session.template_id())))
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveRequest {
    /// Metadata fields apply on the first save and update an existing resume
    /// when present.
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_primary: Option<bool>,
    /// When set on an already persisted resume, the save is also recorded as a version.
    pub change_description: Option<String>,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub resume_id: Uuid,
    pub created: bool,
    pub revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
}

struct Persisted {
    row: ResumeRow,
    created: bool,
    revision: u64,
    version: Option<i32>,
}

/// Creates the resume on first save and updates it afterwards. The session is
/// bound to the new resume id once it exists.
///
/// Runs under the session's persist lock: a concurrent save and export of a
/// session that was never saved create exactly one resume.
async fn persist(
    state: &AppState,
    handle: &SessionHandle,
    req: SaveRequest,
) -> Result<Persisted, AppError> {
    let _persisting = handle.persist_lock().await;
    let (document, template_id, resume_id, user_id, revision) = {
        let session = handle.session.lock().await;
        (
            Arc::clone(session.document()),
            session.template_id().to_string(),
            session.resume_id(),
            session.user_id(),
            session.revision(),
        )
    };
    let theme_color = document.get("themeColor").and_then(Value::as_str);

    match resume_id {
        Some(resume_id) => {
            let mut row = state
                .store
                .update(resume_id, &template_id, &document, theme_color)
                .await?;
            let details = ResumeDetails {
                title: req.title,
                tags: req.tags,
                is_primary: req.is_primary,
            };
            if !details.is_empty() {
                row = state.store.update_details(resume_id, &details).await?;
            }
            let version = match req.change_description.as_deref() {
                Some(note) => Some(state.store.create_version(resume_id, Some(note)).await?.version),
                None => None,
            };
            Ok(Persisted {
                row,
                created: false,
                revision,
                version,
            })
        }
        None => {
            let options = CreateResumeOptions {
                title: req.title,
                theme_color: theme_color.map(str::to_string),
                tags: req.tags.unwrap_or_default(),
                is_primary: req.is_primary.unwrap_or_default(),
            };
            let row = state
                .store
                .create(user_id, &template_id, &document, options)
                .await?;
            handle.session.lock().await.set_resume_id(row.id);
            info!("Session bound to new resume {}", row.id);
            Ok(Persisted {
                row,
                created: true,
                revision,
                version: Some(1),
            })
        }
    }
}

/// POST /api/v1/sessions/:id/save
/// Returns 409 while another save of the same session is in flight.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<SaveRequest>>,
) -> Result<Json<SaveResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    let _guard = handle
        .begin(Action::Save)
        .ok_or_else(|| AppError::Conflict("A save is already in progress".to_string()))?;

    let req = body.map(|Json(req)| req).unwrap_or_default();
    let persisted = persist(&state, &handle, req).await?;

    Ok(Json(SaveResponse {
        resume_id: persisted.row.id,
        created: persisted.created,
        revision: persisted.revision,
        version: persisted.version,
    }))
}

/// POST /api/v1/sessions/:id/export
/// Saves, renders, converts to PDF, archives, and returns the PDF bytes.
/// Returns 409 while another export of the same session is in flight.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let handle = find_session(&state, id).await?;
    let _guard = handle
        .begin(Action::Export)
        .ok_or_else(|| AppError::Conflict("An export is already in progress".to_string()))?;

    let Persisted { row, .. } = persist(&state, &handle, SaveRequest::default()).await?;
    let style = handle.session.lock().await.style().clone();

    let data = ResumeData::from_value_lossy(&row.data);
    let template = state.catalog.get(&row.template_id);
    let html = state
        .renderer
        .render(template, &data, Some(&row.theme_color), false, &style)?;

    let filename = pdf_filename(&data.personal_info.full_name);
    let request = PdfRequest {
        template_id: template.id.clone(),
        theme_color: row.theme_color.clone(),
        html,
        filename: filename.clone(),
        data: row.data.clone(),
    };
    let pdf = state.pdf.render(&request).await?;

    let key = state.archive.store(row.user_id, row.id, pdf.clone()).await?;
    state.store.record_export(row.id, &key).await?;
    info!("Exported resume {} ({} bytes)", row.id, pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}
