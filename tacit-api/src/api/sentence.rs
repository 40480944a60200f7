//! Sentence serving endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use tacit_common::labels::join_labels;
use tacit_common::CategoryGroup;
use tracing::debug;

use crate::dataset::Row;
use crate::error::ApiResult;
use crate::AppState;

/// One sampled sentence with its reference labels
#[derive(Debug, Serialize)]
pub struct SentenceResponse {
    pub sentence: String,
    pub correct_labels: Vec<String>,
    /// Labels joined as `"a, b, c"`
    pub correct_labels_str: String,
    /// `"Unknown"` when the source file has no essay id
    pub essay_id: String,
    pub category_group: CategoryGroup,
}

impl From<&Row> for SentenceResponse {
    fn from(row: &Row) -> Self {
        Self {
            sentence: row.sentence.clone(),
            correct_labels: row.labels.clone(),
            correct_labels_str: join_labels(&row.labels),
            essay_id: row.essay_id_or_unknown().to_string(),
            category_group: row.category_group,
        }
    }
}

/// GET /get-sentence
///
/// Draws one row from a freshly built stratified pool. An empty pool
/// yields 500 `{"error": "No data available"}`.
pub async fn get_sentence(State(state): State<AppState>) -> ApiResult<Json<SentenceResponse>> {
    let row = state
        .rng
        .with_rng(|rng| state.sampler.sample_one(&state.dataset, rng))?;

    debug!(
        group = row.category_group.as_str(),
        labels = %join_labels(&row.labels),
        "Serving sentence"
    );
    Ok(Json(SentenceResponse::from(row)))
}
