//! Category listing for the annotation front-end

use axum::{extract::State, Json};
use serde::Serialize;
use tacit_common::labels::CategoryTarget;
use tacit_common::SENTINEL_CATEGORY;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryTarget>,
    pub sentinel: String,
}

/// GET /categories
///
/// Lists the configured categories in sampling order.
pub async fn get_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: state.sampler.distribution().iter().cloned().collect(),
        sentinel: SENTINEL_CATEGORY.to_string(),
    })
}
