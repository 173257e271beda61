pub mod catalog;
pub mod health;
pub mod resumes;
pub mod sessions;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Catalog
        .route("/api/v1/templates", get(catalog::handle_list_templates))
        .route("/api/v1/templates/:id", get(catalog::handle_get_template))
        .route(
            "/api/v1/variants/:section_type",
            get(catalog::handle_list_variants),
        )
        // Edit sessions
        .route("/api/v1/sessions", post(sessions::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_close_session),
        )
        .route(
            "/api/v1/sessions/:id/fields",
            patch(sessions::handle_update_fields),
        )
        .route(
            "/api/v1/sessions/:id/items",
            post(sessions::handle_add_item).delete(sessions::handle_remove_item),
        )
        .route(
            "/api/v1/sessions/:id/sections",
            post(sessions::handle_add_section),
        )
        .route(
            "/api/v1/sessions/:id/sections/reorder",
            post(sessions::handle_reorder_sections),
        )
        .route(
            "/api/v1/sessions/:id/sections/:section_id",
            delete(sessions::handle_delete_section)
                .patch(sessions::handle_update_section),
        )
        .route(
            "/api/v1/sessions/:id/template",
            post(sessions::handle_switch_template),
        )
        .route(
            "/api/v1/sessions/:id/changes",
            get(sessions::handle_wait_for_change),
        )
        .route(
            "/api/v1/sessions/:id/style",
            get(sessions::handle_get_style).put(sessions::handle_set_style),
        )
        .route("/api/v1/sessions/:id/render", get(sessions::handle_render))
        .route("/api/v1/sessions/:id/ats", get(sessions::handle_ats_report))
        .route("/api/v1/sessions/:id/save", post(sessions::handle_save))
        .route("/api/v1/sessions/:id/export", post(sessions::handle_export))
        // Persisted resumes
        .route("/api/v1/resumes", get(resumes::handle_list_resumes))
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume)
                .patch(resumes::handle_update_resume)
                .delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/duplicate",
            post(resumes::handle_duplicate_resume),
        )
        .route(
            "/api/v1/resumes/:id/versions",
            get(resumes::handle_list_versions),
        )
        .route(
            "/api/v1/resumes/:id/versions/:version/restore",
            post(resumes::handle_restore_version),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::{read_json, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health() {
        let response = build_router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn test_catalog_routes() {
        let router = build_router(test_state());

        let response = router
            .clone()
            .oneshot(Request::get("/api/v1/templates").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(read_json(response).await.as_array().unwrap().len(), 5);

        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/templates/retired-template")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(read_json(response).await["id"], "professional-classic");

        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/variants/volunteer")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["default_variant"], "standard");
        assert_eq!(body["variants"].as_array().unwrap().len(), 5);
        assert_eq!(body["shapes"][0]["shape"], "object_list");

        let response = router
            .oneshot(Request::get("/api/v1/variants/hobbies").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
