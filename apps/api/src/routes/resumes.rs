use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeSummaryRow, ResumeVersionRow};
use crate::state::AppState;
use crate::store::ResumeDetails;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/resumes?user_id=
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeSummaryRow>>, AppError> {
    Ok(Json(state.store.list(params.user_id).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    Ok(Json(state.store.get(id).await?))
}

#[derive(Deserialize)]
pub struct UpdateResumeRequest {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_primary: Option<bool>,
}

/// PATCH /api/v1/resumes/:id
/// Marking a resume primary clears the flag on the user's other resumes.
pub async fn handle_update_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateResumeRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    let details = ResumeDetails {
        title: req.title,
        tags: req.tags,
        is_primary: req.is_primary,
    };
    if details.is_empty() {
        return Err(AppError::Validation(
            "Provide at least one of 'title', 'tags' or 'is_primary'".to_string(),
        ));
    }
    Ok(Json(state.store.update_details(id, &details).await?))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:id/duplicate
pub async fn handle_duplicate_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let copy = state.store.duplicate(id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// GET /api/v1/resumes/:id/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ResumeVersionRow>>, AppError> {
    // surfaces 404 for unknown resumes instead of an empty history
    state.store.get(id).await?;
    Ok(Json(state.store.versions(id).await?))
}

/// POST /api/v1/resumes/:id/versions/:version/restore
pub async fn handle_restore_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(Uuid, i32)>,
) -> Result<Json<ResumeRow>, AppError> {
    Ok(Json(state.store.restore_version(id, version).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::build_router;
    use crate::routes::testing::{json_request, read_json, test_state};
    use crate::store::CreateResumeOptions;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_list_duplicate_and_delete() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let row = state
            .store
            .create(
                user_id,
                "professional-classic",
                &json!({ "personalInfo": { "fullName": "Ada" } }),
                CreateResumeOptions {
                    title: Some("Main".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let router = build_router(state.clone());

        let response = router
            .clone()
            .oneshot(
                Request::post(format!("/api/v1/resumes/{}/duplicate", row.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(read_json(response).await["title"], "Main (Copy)");

        let response = router
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/resumes?user_id={user_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(read_json(response).await.as_array().unwrap().len(), 2);

        let response = router
            .clone()
            .oneshot(
                Request::delete(format!("/api/v1/resumes/{}", row.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(
                Request::get(format!("/api/v1/resumes/{}", row.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_details_keeps_one_primary() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let doc = json!({ "personalInfo": { "fullName": "Ada" } });
        let first = state
            .store
            .create(
                user_id,
                "professional-classic",
                &doc,
                CreateResumeOptions {
                    is_primary: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let second = state
            .store
            .create(user_id, "professional-classic", &doc, Default::default())
            .await
            .unwrap();
        let router = build_router(state.clone());

        let response = router
            .clone()
            .oneshot(json_request(
                Method::PATCH,
                &format!("/api/v1/resumes/{}", second.id),
                json!({ "title": "Staff role", "tags": ["backend"], "is_primary": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["title"], "Staff role");
        assert_eq!(body["tags"], json!(["backend"]));
        assert_eq!(body["is_primary"], true);
        assert!(!state.store.get(first.id).await.unwrap().is_primary);

        let response = router
            .oneshot(json_request(
                Method::PATCH,
                &format!("/api/v1/resumes/{}", second.id),
                json!({ "title": "   " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_restore_version() {
        let state = test_state();
        let row = state
            .store
            .create(
                Uuid::new_v4(),
                "professional-classic",
                &json!({ "personalInfo": { "fullName": "Before" } }),
                Default::default(),
            )
            .await
            .unwrap();
        state
            .store
            .update(
                row.id,
                "professional-classic",
                &json!({ "personalInfo": { "fullName": "After" } }),
                None,
            )
            .await
            .unwrap();
        let router = build_router(state.clone());

        let response = router
            .clone()
            .oneshot(
                Request::post(format!("/api/v1/resumes/{}/versions/1/restore", row.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let restored = read_json(response).await;
        assert_eq!(restored["data"]["personalInfo"]["fullName"], "Before");

        let response = router
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/resumes/{}/versions", row.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let versions = read_json(response).await;
        assert_eq!(versions.as_array().unwrap().len(), 2);
        assert_eq!(versions[0]["version"], 2);

        let response = router
            .oneshot(
                Request::post(format!("/api/v1/resumes/{}/versions/7/restore", row.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
