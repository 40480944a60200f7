//! Annotation checking endpoints
//!
//! Neither endpoint stores anything; they only compare the annotator's
//! answer against the reference labels the client echoes back.

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use tacit_common::labels::is_sentinel;
use tacit_common::SENTINEL_CATEGORY;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Body of POST /submit-annotation
#[derive(Debug, Deserialize)]
pub struct SubmitAnnotationRequest {
    #[serde(default)]
    pub user_selection: Option<String>,
    #[serde(default)]
    pub correct_label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnnotationResponse {
    pub is_correct: bool,
}

/// POST /submit-annotation
///
/// Single-label check. Missing or blank fields, or a body that is not JSON,
/// yield 400 `{"error": "Invalid data received."}`.
pub async fn submit_annotation(
    payload: Result<Json<SubmitAnnotationRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitAnnotationResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Annotation body rejected: {}", rejection);
        ApiError::invalid_data()
    })?;

    let user_selection = present(request.user_selection).ok_or_else(ApiError::invalid_data)?;
    let correct_label = present(request.correct_label).ok_or_else(ApiError::invalid_data)?;

    Ok(Json(SubmitAnnotationResponse {
        is_correct: user_selection == correct_label,
    }))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of POST /check-labels
#[derive(Debug, Deserialize)]
pub struct CheckLabelsRequest {
    #[serde(default)]
    pub user_selection: Vec<String>,
    #[serde(default)]
    pub correct_labels: Vec<String>,
}

/// Per-label feedback for a multi-label answer
#[derive(Debug, PartialEq, Serialize)]
pub struct LabelFeedback {
    pub is_correct: bool,
    /// Selected and correct, in selection order
    pub correct_selected: Vec<String>,
    /// Selected but not correct, in selection order
    pub incorrect_selected: Vec<String>,
    /// Correct but not selected, in reference order
    pub missed_correct: Vec<String>,
}

impl LabelFeedback {
    /// Compare a selection against reference labels
    ///
    /// Sentinel spellings (`Class 0`, `none`, ...) compare equal, and an empty
    /// reference list means the sentence is Class0.
    pub fn compare(user_selection: &[String], correct_labels: &[String]) -> Self {
        let selected = canonical(user_selection);
        let mut correct = canonical(correct_labels);
        if correct.is_empty() {
            correct.push(SENTINEL_CATEGORY.to_string());
        }

        let (correct_selected, incorrect_selected): (Vec<String>, Vec<String>) = selected
            .iter()
            .cloned()
            .partition(|label| correct.contains(label));
        let missed_correct: Vec<String> = correct
            .iter()
            .filter(|label| !selected.contains(label))
            .cloned()
            .collect();

        Self {
            is_correct: incorrect_selected.is_empty() && missed_correct.is_empty(),
            correct_selected,
            incorrect_selected,
            missed_correct,
        }
    }
}

fn canonical(labels: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim();
        let label = if is_sentinel(label) {
            SENTINEL_CATEGORY
        } else {
            label
        };
        if !label.is_empty() && !out.iter().any(|l| l == label) {
            out.push(label.to_string());
        }
    }
    out
}

/// POST /check-labels
///
/// Multi-label check used by the "select all applicable categories" view.
/// An empty selection is rejected with 400.
pub async fn check_labels(
    payload: Result<Json<CheckLabelsRequest>, JsonRejection>,
) -> ApiResult<Json<LabelFeedback>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Label check body rejected: {}", rejection);
        ApiError::invalid_data()
    })?;

    if request.user_selection.is_empty() {
        return Err(ApiError::BadRequest(
            "Please select at least one option before submitting.".to_string(),
        ));
    }

    Ok(Json(LabelFeedback::compare(
        &request.user_selection,
        &request.correct_labels,
    )))
}
