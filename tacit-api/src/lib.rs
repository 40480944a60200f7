//! tacit-api library - sentence service for the TACIT annotation tool
//!
//! Loads labeled sentence datasets once at startup and serves
//! category-stratified random samples over a small JSON API.

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tacit_common::config::ServiceConfig;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod api;
pub mod dataset;
pub mod error;
pub mod sampler;

use dataset::{Dataset, DatasetLoader};
use error::ApiError;
use sampler::{RngSource, Sampler};

/// Module name reported by health and banner endpoints
pub const MODULE_NAME: &str = "tacit-api";

/// Application state shared across HTTP handlers
///
/// Everything here is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub sampler: Arc<Sampler>,
    pub rng: RngSource,
}

impl AppState {
    /// Create new application state
    pub fn new(dataset: Dataset, sampler: Sampler, rng: RngSource) -> Self {
        Self {
            dataset: Arc::new(dataset),
            sampler: Arc::new(sampler),
            rng,
        }
    }

    /// Load every configured dataset and assemble the state
    ///
    /// Fails on the first missing file or column.
    pub fn from_config(config: &ServiceConfig) -> tacit_common::Result<Self> {
        let dataset = DatasetLoader::new(&config.columns).load(&config.sources)?;

        let uncovered: Vec<&str> = dataset
            .observed_labels()
            .into_iter()
            .filter(|label| config.distribution.get(label).is_none())
            .collect();
        if !uncovered.is_empty() {
            warn!(
                "Labels not in the category distribution are never sampled directly: {}",
                uncovered.join(", ")
            );
        }
        if dataset.is_empty() {
            warn!("Dataset is empty; /get-sentence will report no data");
        }

        let sampler = Sampler::new(config.sampling, config.distribution.clone());
        info!(
            "Sampler: {:?} over {} categories",
            sampler.mode(),
            sampler.distribution().len()
        );

        Ok(Self::new(dataset, sampler, RngSource::from_seed(config.seed)))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/get-sentence", get(api::get_sentence))
        .route("/stats", get(api::get_stats))
        .route("/categories", get(api::get_categories))
        .route("/submit-annotation", post(api::submit_annotation))
        .route("/check-labels", post(api::check_labels))
        .route("/build_info", get(api::get_build_info))
        .merge(api::health_routes())
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        // The annotation front-end is served from another origin
        .layer(CorsLayer::permissive())
}

/// Convert a handler panic into the standard JSON error body
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(format!("Internal error: {}", detail)).into_response()
}
