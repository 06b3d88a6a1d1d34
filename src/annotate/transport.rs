//! Outbound HTTP for annotate calls.
//!
//! [`Transport::dispatch`] takes the request in call order and hands back a
//! `'static` future for its completion, so a caller can issue requests in a
//! fixed order and let them finish in any order.
//!
//! [`HttpTransport`] builds the request inside `dispatch`; `reqwest` puts it
//! on the wire when the returned future is first polled.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::debug;

use super::request::AnnotationRequest;
use crate::config::VisionConfig;
use crate::error::{VisionError, VisionResult, redacted_url};

/// Status line and body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Completion of a dispatched request.
pub type PendingResponse = BoxFuture<'static, VisionResult<RawResponse>>;

/// Anything that can POST an annotate body.
pub trait Transport: Send + Sync + 'static {
    /// Issue one POST of `request` to `url`.
    fn dispatch(&self, url: Url, request: &AnnotationRequest) -> PendingResponse;
}

/// `reqwest`-backed transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &VisionConfig) -> VisionResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(VisionError::from)?;
        Ok(Self { client })
    }

    /// Wrap an existing client, keeping its settings.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn dispatch(&self, url: Url, request: &AnnotationRequest) -> PendingResponse {
        let target = redacted_url(&url);
        debug!(url = %target, "dispatching annotate request");

        let body = match request.to_vec() {
            Ok(body) => body,
            Err(e) => {
                let failed: VisionResult<RawResponse> = Err(VisionError::from(e));
                return futures_util::future::ready(failed).boxed();
            }
        };
        let pending = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send();

        async move {
            let response = pending.await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?.to_vec();
            debug!(url = %target, status, bytes = body.len(), "annotate response received");
            Ok(RawResponse { status, body })
        }
        .boxed()
    }
}
