//! # Image Detection Library
//!
//! Sends a picked image to a cloud vision annotate endpoint and hands back the
//! label annotations it finds.
//!
//! ## Architecture
//!
//! The library is a linear three-stage pipeline:
//! - `encoding`: RGBA8 → PNG → size guard (one resize to 800px wide) → base64
//! - `annotate`: JSON request construction, HTTP POST, response extraction
//! - `pipeline`: single FIFO background worker so callers never block
//! - `config`: injected client configuration (API key, endpoint, limits)
//! - `error`: failure types, all funneled into one result per request
//!
//! ## Features
//!
//! - **Size-bounded uploads**: PNG above 2 MiB is re-rendered once at 800px wide
//! - **Explicit failures**: encode, network and remote failures are distinct
//!   [`FailureKind`]s instead of being dropped
//! - **Ordered dispatch**: requests leave in submission order even though
//!   answers may come back in any order
//!
//! ## Example
//!
//! ```rust,no_run
//! use image_detection::{VisionConfig, analyze_bytes};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VisionConfig::new("my-api-key");
//! let bytes = std::fs::read("cat.jpg")?;
//!
//! for label in analyze_bytes(config, &bytes).await? {
//!     println!("{} = {}", label.description, label.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod config;
pub mod encoding;
pub mod error;
pub mod pipeline;

/// Re-export error types for convenience
pub use error::{ErrorSeverity, FailureKind, HasRecoverySuggestion, HasSeverity, VisionError, VisionResult};

pub use annotate::{LabelAnnotation, VisionClient, extract, format_labels};
pub use config::{RequestShape, VisionConfig};
pub use encoding::{EncodedImage, ImageEncoder, ImagePayload};
pub use pipeline::{AnalysisOutcome, AnalysisTicket, AnalyzeQueue};

/// Run one analyze cycle on an encoded image file (PNG or JPEG).
///
/// Builds a client and encoder from `config`, decodes `bytes`, and returns the
/// label annotations of the first result.
///
/// # Errors
///
/// - [`FailureKind::Local`] if `config` does not validate
/// - [`FailureKind::Encode`] if the bytes do not decode or serialization fails
/// - [`FailureKind::Network`] on transport failure
/// - [`FailureKind::Remote`] on an error envelope, a failing status, or an
///   unreadable response
pub async fn analyze_bytes(config: VisionConfig, bytes: &[u8]) -> VisionResult<Vec<LabelAnnotation>> {
    let encoder = ImageEncoder::new(&config);
    let client = VisionClient::new(config)?;
    let image = ImagePayload::decode(bytes)?;
    client.analyze(&encoder, &image).await
}
