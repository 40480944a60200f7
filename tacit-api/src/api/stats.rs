//! Dataset statistics endpoint

use axum::{extract::State, Json};

use crate::dataset::DatasetStats;
use crate::AppState;

/// GET /stats
///
/// Scans the dataset on every call; the table is small and never changes.
pub async fn get_stats(State(state): State<AppState>) -> Json<DatasetStats> {
    Json(state.dataset.stats(state.sampler.distribution().iter()))
}
