//! Common test utilities shared by the integration tests.
//!
//! - `fake_transport`: scripted in-memory [`Transport`] that records dispatch order
//! - `http_stub`: one-shot HTTP responder on a local TCP port
//! - `test_images`: synthetic RGBA8 images and serializers

#![allow(dead_code)]

/// In-memory transport for driving the client without a network.
pub mod fake_transport {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use futures_util::FutureExt;
    use image_detection::annotate::{AnnotationRequest, PendingResponse, RawResponse, Transport};
    use image_detection::error::VisionError;
    use reqwest::Url;

    /// What the fake answers for one dispatch.
    #[derive(Clone, Debug)]
    pub enum Scripted {
        Respond { delay: Duration, response: RawResponse },
        Fail { delay: Duration },
    }

    impl Scripted {
        pub fn ok(body: &str) -> Self {
            Self::Respond {
                delay: Duration::ZERO,
                response: RawResponse::ok(body),
            }
        }

        pub fn ok_after(delay_ms: u64, body: &str) -> Self {
            Self::Respond {
                delay: Duration::from_millis(delay_ms),
                response: RawResponse::ok(body),
            }
        }

        pub fn status(status: u16, body: &str) -> Self {
            Self::Respond {
                delay: Duration::ZERO,
                response: RawResponse {
                    status,
                    body: body.as_bytes().to_vec(),
                },
            }
        }

        pub fn network_failure() -> Self {
            Self::Fail {
                delay: Duration::ZERO,
            }
        }
    }

    #[derive(Clone, Default)]
    pub struct FakeTransport {
        script: Arc<Mutex<VecDeque<Scripted>>>,
        dispatched: Arc<Mutex<Vec<(Url, AnnotationRequest)>>>,
    }

    impl FakeTransport {
        pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into_iter().collect())),
                dispatched: Arc::default(),
            }
        }

        /// Requests in the order `dispatch` was called.
        pub fn dispatched(&self) -> Vec<(Url, AnnotationRequest)> {
            self.dispatched.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        fn dispatch(&self, url: Url, request: &AnnotationRequest) -> PendingResponse {
            self.dispatched.lock().unwrap().push((url, request.clone()));
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Scripted::ok(r#"{"responses":[{}]}"#));
            async move {
                match next {
                    Scripted::Respond { delay, response } => {
                        tokio::time::sleep(delay).await;
                        Ok(response)
                    }
                    Scripted::Fail { delay } => {
                        tokio::time::sleep(delay).await;
                        Err(VisionError::network("connect").with_address("fake"))
                    }
                }
            }
            .boxed()
        }
    }
}

/// Minimal HTTP/1.1 responder for exercising the real `reqwest` transport.
pub mod http_stub {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Request line, headers and body as received by the stub.
    #[derive(Debug)]
    pub struct CapturedRequest {
        pub head: String,
        pub body: Vec<u8>,
    }

    impl CapturedRequest {
        pub fn request_line(&self) -> &str {
            self.head.lines().next().unwrap_or_default()
        }

        pub fn header(&self, name: &str) -> Option<String> {
            self.head.lines().skip(1).find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case(name)
                    .then(|| value.trim().to_string())
            })
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    /// Accept one connection, answer with `status` and `body`, return what was sent.
    pub async fn serve_once(status: u16, body_out: &'static str) -> (String, JoinHandle<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 8192];

            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = find(&buf, b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (key, value) = line.split_once(':')?;
                    key.trim()
                        .eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while buf.len() < head_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed mid-body");
                buf.extend_from_slice(&chunk[..n]);
            }
            let body = buf[head_end..head_end + content_length].to_vec();

            let reply = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body_out.len(),
                body_out
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            CapturedRequest { head, body }
        });

        (base, handle)
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }
}

/// Synthetic images.
pub mod test_images {
    use image_detection::encoding::{ImagePayload, PngSerializer, RasterSerializer};
    use image_detection::error::VisionResult;

    /// Deterministic gradient so PNG output is stable.
    pub fn gradient(width: u32, height: u32) -> ImagePayload {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]);
            }
        }
        ImagePayload::from_rgba(width, height, rgba)
    }

    /// Reports a fixed serialized size for one particular source size and
    /// real PNG bytes for everything else.
    pub struct InflatedSerializer {
        pub width: u32,
        pub height: u32,
        pub inflated_len: usize,
    }

    impl RasterSerializer for InflatedSerializer {
        fn serialize(&self, image: &ImagePayload) -> VisionResult<Vec<u8>> {
            if (image.width, image.height) == (self.width, self.height) {
                Ok(vec![0u8; self.inflated_len])
            } else {
                PngSerializer.serialize(image)
            }
        }
    }
}
