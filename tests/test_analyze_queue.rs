//! Background worker ordering and the single failure channel.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fake_transport::{FakeTransport, Scripted};
use common::test_images::gradient;
use image_detection::{AnalyzeQueue, FailureKind, ImageEncoder, VisionClient, VisionConfig};
use tokio::sync::mpsc;

fn labels(name: &str) -> String {
    format!(
        r#"{{"responses":[{{"labelAnnotations":[{{"description":"{}","score":0.5}}]}}]}}"#,
        name
    )
}

fn queue_with(transport: FakeTransport) -> AnalyzeQueue {
    let config = VisionConfig::new("k");
    let encoder = Arc::new(ImageEncoder::new(&config));
    let client = Arc::new(VisionClient::with_transport(config, transport).unwrap());
    AnalyzeQueue::spawn(client, encoder)
}

#[tokio::test]
async fn test_dispatch_is_fifo_while_completions_are_not() {
    // First answer is slow, second fast.
    let transport = FakeTransport::new([
        Scripted::ok_after(200, &labels("first")),
        Scripted::ok(&labels("second")),
    ]);
    let queue = queue_with(transport.clone());

    let first = queue.submit(gradient(10, 10));
    let second = queue.submit(gradient(20, 10));
    assert_eq!((first.sequence(), second.sequence()), (0, 1));

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    for ticket in [first, second] {
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            let sequence = ticket.sequence();
            let outcome = ticket.await.unwrap();
            done_tx.send((sequence, outcome[0].description.clone())).unwrap();
        });
    }

    let a = done_rx.recv().await.unwrap();
    let b = done_rx.recv().await.unwrap();
    assert_eq!(a, (1, "second".to_string()));
    assert_eq!(b, (0, "first".to_string()));

    // Encoded payloads went out in submission order.
    let sent: Vec<u32> = transport
        .dispatched()
        .iter()
        .map(|(_, request)| {
            let png = base64::Engine::decode(
                &base64::engine::general_purpose::STANDARD,
                &request.item.image.content,
            )
            .unwrap();
            image::load_from_memory(&png).unwrap().width()
        })
        .collect();
    assert_eq!(sent, vec![10, 20]);
}

#[tokio::test]
async fn test_failures_reach_the_ticket() {
    let transport = FakeTransport::new([Scripted::network_failure(), Scripted::ok(r#"{"error":{"code":7}}"#)]);
    let queue = queue_with(transport.clone());

    let encode = queue.submit(image_detection::ImagePayload::from_rgba(0, 1, Vec::new()));
    let network = queue.submit(gradient(4, 4));
    let remote = queue.submit(gradient(4, 4));

    assert_eq!(encode.await.unwrap_err().kind(), FailureKind::Encode);
    assert_eq!(network.await.unwrap_err().kind(), FailureKind::Network);
    assert_eq!(remote.await.unwrap_err().kind(), FailureKind::Remote);
    // The encode failure never reached the transport.
    assert_eq!(transport.dispatched().len(), 2);
}

#[tokio::test]
async fn test_submit_with_invokes_callback_once() {
    let queue = queue_with(FakeTransport::new([Scripted::ok(&labels("Cat"))]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let sequence = queue.submit_with(gradient(4, 4), move |outcome| {
        tx.send(outcome.map(|labels| labels.len())).unwrap();
    });
    assert_eq!(sequence, 0);
    assert_eq!(rx.recv().await.unwrap().unwrap(), 1);
    // Sender moved into the callback is gone once it ran.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_shutdown_drains_queued_jobs() {
    let transport = FakeTransport::new([
        Scripted::ok_after(50, &labels("a")),
        Scripted::ok(&labels("b")),
    ]);
    let queue = queue_with(transport.clone());
    let first = queue.submit(gradient(4, 4));
    let second = queue.submit(gradient(4, 4));
    assert_eq!(queue.submitted(), 2);

    queue.shutdown().await;
    assert_eq!(transport.dispatched().len(), 2);

    let results = tokio::time::timeout(Duration::from_secs(5), async {
        (first.await, second.await)
    })
    .await
    .unwrap();
    assert_eq!(results.0.unwrap()[0].description, "a");
    assert_eq!(results.1.unwrap()[0].description, "b");
}

#[tokio::test]
async fn test_unrenderable_resize_fails_only_its_ticket() {
    let config = VisionConfig::new("k").with_size_ceiling(64);
    let encoder = Arc::new(ImageEncoder::new(&config));
    let transport = FakeTransport::new([Scripted::ok(&labels("after"))]);
    let client = Arc::new(VisionClient::with_transport(config, transport.clone()).unwrap());
    let queue = AnalyzeQueue::spawn(client, encoder);

    let tall = queue.submit(gradient(1, 100_000));
    let next = queue.submit(gradient(8, 8));

    assert_eq!(tall.await.unwrap_err().kind(), FailureKind::Encode);
    assert_eq!(next.await.unwrap()[0].description, "after");
    assert_eq!(transport.dispatched().len(), 1);
}
