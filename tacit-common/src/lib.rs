//! # TACIT Common Library
//!
//! Shared code for the TACIT sentence service including:
//! - Error types
//! - Bootstrap configuration loading
//! - CCT label parsing and category distributions

pub mod config;
pub mod error;
pub mod labels;

pub use error::{Error, Result};
pub use labels::{CategoryDistribution, CategoryGroup, SENTINEL_CATEGORY};
