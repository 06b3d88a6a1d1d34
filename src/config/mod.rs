//! # Configuration Module
//!
//! This module provides the configuration structure injected into the vision client.

pub mod config;

pub use config::{
    API_KEY_ENV, ANNOTATE_PATH, DEFAULT_ENDPOINT, DEFAULT_MAX_RESULTS, DEFAULT_RESIZE_WIDTH,
    DEFAULT_SIZE_CEILING, RequestShape, VisionConfig,
};
