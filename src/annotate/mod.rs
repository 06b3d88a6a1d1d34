//! # Annotate Module
//!
//! Request construction, HTTP dispatch and response extraction for the vision
//! annotate endpoint.
//!
//! 1. **request**: the JSON body (`image.content` + four feature specs)
//! 2. **transport**: the outbound POST behind the [`Transport`] seam
//! 3. **response**: envelope parsing and label extraction
//! 4. **client**: [`VisionClient`] tying the three together

pub mod client;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{PendingAnnotation, VisionClient};
pub use request::{AnnotateItem, AnnotationRequest, FeatureSpec, FeatureType, ImageContent};
pub use response::{
    AnnotationResponse, EntityAnnotation, ErrorEnvelope, ImageResult, LabelAnnotation,
    ResultEnvelope, extract, format_labels,
};
pub use transport::{HttpTransport, PendingResponse, RawResponse, Transport};
