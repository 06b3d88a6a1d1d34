//! Vision client: request construction, dispatch and response handling.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{info, warn};

use super::request::AnnotationRequest;
use super::response::{AnnotationResponse, LabelAnnotation};
use super::transport::{HttpTransport, RawResponse, Transport};
use crate::config::VisionConfig;
use crate::encoding::{EncodedImage, ImageEncoder, ImagePayload};
use crate::error::{VisionError, VisionResult};

/// Completion of one dispatched annotate call, already parsed.
pub type PendingAnnotation = BoxFuture<'static, VisionResult<AnnotationResponse>>;

/// Client for the annotate endpoint.
///
/// Holds the injected configuration and a [`Transport`]. Cheap to share behind
/// an `Arc`; every call is independent.
pub struct VisionClient {
    config: VisionConfig,
    transport: Arc<dyn Transport>,
}

impl VisionClient {
    /// Create a client talking HTTP through `reqwest`.
    pub fn new(config: VisionConfig) -> VisionResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, transport)
    }

    /// Create a client on top of a custom transport.
    pub fn with_transport<T: Transport>(config: VisionConfig, transport: T) -> VisionResult<Self> {
        config
            .validate()
            .map_err(|reason| VisionError::config("vision_config", reason))?;
        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Build the request body for `image`.
    pub fn build_request(&self, image: &EncodedImage) -> AnnotationRequest {
        AnnotationRequest::new(image, self.config.max_results, self.config.request_shape)
    }

    /// Hand the request for `image` to the transport and return its completion.
    pub fn dispatch(&self, image: &EncodedImage) -> VisionResult<PendingAnnotation> {
        let url = self.config.annotate_url()?;
        let request = self.build_request(image);
        let pending = self.transport.dispatch(url, &request);
        Ok(async move { interpret(pending.await?) }.boxed())
    }

    /// Send `image` and parse the response.
    pub async fn annotate(&self, image: &EncodedImage) -> VisionResult<AnnotationResponse> {
        self.dispatch(image)?.await
    }

    /// One full cycle inline: encode, send, extract labels.
    pub async fn analyze(
        &self,
        encoder: &ImageEncoder,
        image: &ImagePayload,
    ) -> VisionResult<Vec<LabelAnnotation>> {
        let encoded = encoder.encode(image)?;
        let labels = self.annotate(&encoded).await?.into_labels();
        log_outcome(&labels);
        labels
    }
}

/// Turn a raw HTTP answer into a parsed response.
///
/// The service sends an error envelope alongside failing status codes; when a
/// failing status comes without one, the status itself becomes the remote error.
fn interpret(raw: RawResponse) -> VisionResult<AnnotationResponse> {
    let parsed = AnnotationResponse::from_slice(&raw.body);
    if raw.is_success() {
        return parsed;
    }
    match parsed {
        Ok(response) if response.is_error() => Ok(response),
        _ => Err(VisionError::remote(
            Some(raw.status as i64),
            format!("HTTP status {}", raw.status),
        )
        .with_metadata("body_bytes", raw.body.len().to_string())),
    }
}

pub(crate) fn log_outcome(outcome: &VisionResult<Vec<LabelAnnotation>>) {
    match outcome {
        Ok(labels) => info!(labels = labels.len(), "annotation complete"),
        Err(e) => warn!(category = e.category(), error = %e, "annotation failed"),
    }
}
