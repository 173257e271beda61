use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::document::SectionType;
use crate::render::variants::VariantMeta;
use crate::render::TemplateDefinition;
use crate::sections::shapes::{variants_of, ShapeDescriptor};
use crate::state::AppState;

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
) -> Json<Vec<TemplateDefinition>> {
    Json(state.catalog.all().to_vec())
}

/// GET /api/v1/templates/:id
/// Unknown ids resolve to the fallback template.
pub async fn handle_get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<TemplateDefinition> {
    Json(state.catalog.get(&id).clone())
}

#[derive(Serialize)]
pub struct VariantListResponse {
    pub section_type: SectionType,
    pub default_variant: Option<&'static str>,
    pub variants: &'static [VariantMeta],
    /// Payload shape each variant expects when added as a dynamic section.
    pub shapes: Vec<&'static ShapeDescriptor>,
}

/// GET /api/v1/variants/:section_type
pub async fn handle_list_variants(
    State(state): State<AppState>,
    Path(section_type): Path<String>,
) -> Result<Json<VariantListResponse>, AppError> {
    let section_type = section_type
        .parse::<SectionType>()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let registry = state.renderer.variants();

    Ok(Json(VariantListResponse {
        section_type,
        default_variant: registry.default_variant(section_type).map(|v| v.id),
        variants: registry.variants(section_type),
        shapes: variants_of(section_type).collect(),
    }))
}
