//! # Configuration Module
//!
//! This module provides the configuration structure and validation for the
//! vision client. A [`VisionConfig`] is built once and handed to
//! [`VisionClient`](crate::annotate::client::VisionClient) at construction; nothing reads
//! process-wide state afterwards.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `api_key` | `String` | empty | Key sent as the `key` query parameter |
//! | `endpoint` | `String` | `https://vision.googleapis.com` | Service base URL |
//! | `max_results` | `u32` | 5 | Result cap for every requested feature |
//! | `size_ceiling_bytes` | `usize` | 2 MiB | Serialized size above which the image is resized |
//! | `resize_width` | `u32` | 800 | Width used by the single resize pass |
//! | `request_shape` | `RequestShape` | `Single` | Whether `requests` is an object or an array |
//! | `request_timeout` | `Option<Duration>` | `None` | Transport timeout, HTTP stack default when unset |
//!
//! ## Examples
//!
//! ```rust
//! use image_detection::config::VisionConfig;
//!
//! let config = VisionConfig::new("my-api-key");
//! assert!(config.validate().is_ok());
//!
//! let local = VisionConfig::new("my-api-key").with_endpoint("http://127.0.0.1:8080");
//! assert_eq!(local.annotate_url().unwrap().path(), "/v1/images:annotate");
//! ```

use std::time::Duration;

use crate::error::{VisionError, VisionResult};

/// Environment variable read by [`VisionConfig::from_env`].
pub const API_KEY_ENV: &str = "VISION_API_KEY";

/// Default service base URL.
pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com";

/// Path of the annotate method below the endpoint.
pub const ANNOTATE_PATH: &str = "/v1/images:annotate";

/// Serialized size above which an image is resized before upload (2 MiB).
pub const DEFAULT_SIZE_CEILING: usize = 2_097_152;

/// Width the single resize pass targets.
pub const DEFAULT_RESIZE_WIDTH: u32 = 800;

/// Result cap for each requested feature.
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// Shape of the top-level `requests` member in the annotate body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestShape {
    /// `"requests": { ... }`, a single object. This is what the app has always sent.
    #[default]
    Single,
    /// `"requests": [{ ... }]`, the documented batch form.
    Batch,
}

/// Configuration for the vision client.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use image_detection::config::{RequestShape, VisionConfig};
///
/// let config = VisionConfig::new("key")
///     .with_request_shape(RequestShape::Batch)
///     .with_timeout(Duration::from_secs(30));
/// assert_eq!(config.request_shape, RequestShape::Batch);
/// ```
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Static API key.
    ///
    /// Sent verbatim (URL-encoded) as the `key` query parameter. Must not be empty.
    pub api_key: String,

    /// Base URL of the vision service, without a trailing path.
    pub endpoint: String,

    /// `maxResults` attached to each of the four feature requests.
    pub max_results: u32,

    /// Serialized PNG size, in bytes, above which the image is resized once.
    pub size_ceiling_bytes: usize,

    /// Output width for the resize pass. Height follows the aspect ratio.
    pub resize_width: u32,

    /// Whether `requests` is serialized as an object or a one-element array.
    pub request_shape: RequestShape,

    /// Transport timeout. `None` leaves the HTTP stack default in place.
    pub request_timeout: Option<Duration>,
}

impl Default for VisionConfig {
    /// Creates a configuration with an empty API key, which fails validation.
    ///
    /// ```rust
    /// use image_detection::config::VisionConfig;
    ///
    /// let config = VisionConfig::default();
    /// assert_eq!(config.max_results, 5);
    /// assert_eq!(config.size_ceiling_bytes, 2 * 1024 * 1024);
    /// assert!(config.validate().is_err());
    /// ```
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            size_ceiling_bytes: DEFAULT_SIZE_CEILING,
            resize_width: DEFAULT_RESIZE_WIDTH,
            request_shape: RequestShape::Single,
            request_timeout: None,
        }
    }
}

impl VisionConfig {
    /// Creates a default configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Reads the API key from `VISION_API_KEY`.
    pub fn from_env() -> VisionResult<Self> {
        let key = std::env::var(API_KEY_ENV).map_err(|_| {
            VisionError::config("api_key", format!("{} is not set", API_KEY_ENV))
                .with_recovery_suggestion(format!("export {}=<your key>", API_KEY_ENV))
        })?;
        Ok(Self::new(key))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_size_ceiling(mut self, bytes: usize) -> Self {
        self.size_ceiling_bytes = bytes;
        self
    }

    pub fn with_resize_width(mut self, width: u32) -> Self {
        self.resize_width = width;
        self
    }

    pub fn with_request_shape(mut self, shape: RequestShape) -> Self {
        self.request_shape = shape;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("API key must not be empty".to_string());
        }
        if self.max_results == 0 {
            return Err("maxResults must be greater than 0".to_string());
        }
        if self.size_ceiling_bytes == 0 {
            return Err("Size ceiling must be greater than 0 bytes".to_string());
        }
        if self.resize_width == 0 {
            return Err("Resize width must be greater than 0".to_string());
        }
        if let Some(timeout) = self.request_timeout {
            if timeout.is_zero() {
                return Err("Request timeout must be greater than 0".to_string());
            }
        }
        reqwest::Url::parse(&self.endpoint)
            .map_err(|e| format!("Invalid endpoint '{}': {}", self.endpoint, e))?;
        Ok(())
    }

    /// Full annotate URL with the key attached as a query parameter.
    pub fn annotate_url(&self) -> VisionResult<reqwest::Url> {
        let base = self.endpoint.trim_end_matches('/');
        let mut url = reqwest::Url::parse(&format!("{}{}", base, ANNOTATE_PATH))
            .map_err(|e| VisionError::config("endpoint", e.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}
