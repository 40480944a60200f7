//! HTTP API handlers for tacit-api

pub mod annotation;
pub mod buildinfo;
pub mod categories;
pub mod health;
pub mod sentence;
pub mod stats;

pub use annotation::{check_labels, submit_annotation};
pub use buildinfo::get_build_info;
pub use categories::get_categories;
pub use health::{health_routes, service_info};
pub use sentence::get_sentence;
pub use stats::get_stats;
