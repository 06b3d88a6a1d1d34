//! # Analyze Queue
//!
//! Single background worker that runs the encode → dispatch stage for every
//! submitted image, one at a time, in submission order.
//!
//! ## Threading Model
//!
//! - **Caller**: `submit` never blocks; it enqueues the image and returns an
//!   [`AnalysisTicket`]
//! - **Worker task**: pulls jobs FIFO, encodes on the blocking pool, dispatches
//!   the POST, then moves on without waiting for the answer
//! - **Completion tasks**: one per in-flight request; parses the answer and
//!   fulfils the ticket. Completions may land out of order
//!
//! ## Ordering Guarantee
//!
//! Submission order is kept up to the [`Transport::dispatch`] handoff: encode
//! and dispatch run one job at a time. The HTTP transport writes to the socket
//! only once the completion task is first polled, and on a multi-thread
//! runtime two completion tasks spawned back to back may start in either
//! order. Requests are therefore handed to the transport FIFO, but need not
//! reach the wire FIFO.
//!
//! [`Transport::dispatch`]: crate::annotate::Transport::dispatch
//!
//! ## Overlapping Selections
//!
//! Nothing stops a second submission while the first is in flight, and there
//! is no cancellation: both requests run and both tickets resolve. Tickets
//! carry a [`sequence`](AnalysisTicket::sequence) so presentation code can drop
//! a result older than the one it already shows.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span};

use crate::annotate::client::{VisionClient, log_outcome};
use crate::annotate::response::LabelAnnotation;
use crate::encoding::{EncodedImage, ImageEncoder, ImagePayload};
use crate::error::{VisionError, VisionResult};

/// Final result of one analyze cycle.
pub type AnalysisOutcome = VisionResult<Vec<LabelAnnotation>>;

struct Job {
    sequence: u64,
    image: ImagePayload,
    reply: oneshot::Sender<AnalysisOutcome>,
}

/// Resolves exactly once with the outcome of one submission.
#[derive(Debug)]
pub struct AnalysisTicket {
    sequence: u64,
    rx: oneshot::Receiver<AnalysisOutcome>,
}

impl AnalysisTicket {
    /// Submission order, starting at 0 for the first image of a queue.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Future for AnalysisTicket {
    type Output = AnalysisOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(VisionError::state("analyze queue is stopped", "deliver result"))
            })
        })
    }
}

/// Handle to the background worker. Dropping every handle stops the worker
/// once queued jobs are dispatched.
pub struct AnalyzeQueue {
    tx: mpsc::UnboundedSender<Job>,
    next_sequence: AtomicU64,
    worker: JoinHandle<()>,
}

impl AnalyzeQueue {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(client: Arc<VisionClient>, encoder: Arc<ImageEncoder>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(rx, client, encoder));
        Self {
            tx,
            next_sequence: AtomicU64::new(0),
            worker,
        }
    }

    /// Enqueue `image` for analysis.
    pub fn submit(&self, image: ImagePayload) -> AnalysisTicket {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();
        // A closed channel drops the job and its reply; the ticket then
        // resolves to a state error.
        if self.tx.send(Job { sequence, image, reply }).is_err() {
            debug!(sequence, "analyze queue closed, submission dropped");
        }
        AnalysisTicket { sequence, rx }
    }

    /// Enqueue `image` and hand the outcome to `on_done` when it arrives.
    pub fn submit_with<F>(&self, image: ImagePayload, on_done: F) -> u64
    where
        F: FnOnce(AnalysisOutcome) + Send + 'static,
    {
        let ticket = self.submit(image);
        let sequence = ticket.sequence();
        tokio::spawn(async move { on_done(ticket.await) });
        sequence
    }

    /// Number of submissions so far.
    pub fn submitted(&self) -> u64 {
        self.next_sequence.load(Ordering::Relaxed)
    }

    /// Stop accepting work and wait until every queued job has been dispatched.
    /// In-flight requests keep running and still resolve their tickets.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            debug!(error = %e, "analyze worker ended abnormally");
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Job>,
    client: Arc<VisionClient>,
    encoder: Arc<ImageEncoder>,
) {
    while let Some(Job {
        sequence,
        image,
        reply,
    }) = rx.recv().await
    {
        let span = info_span!("analyze", sequence);
        let pending = encode_on_pool(&encoder, image)
            .instrument(span.clone())
            .await
            .and_then(|encoded| client.dispatch(&encoded));

        match pending {
            Ok(pending) => {
                tokio::spawn(
                    async move {
                        let outcome = pending.await.and_then(|response| response.into_labels());
                        log_outcome(&outcome);
                        let _ = reply.send(outcome);
                    }
                    .instrument(span),
                );
            }
            Err(e) => {
                let outcome = Err(e);
                span.in_scope(|| log_outcome(&outcome));
                let _ = reply.send(outcome);
            }
        }
    }
    debug!("analyze worker stopped");
}

async fn encode_on_pool(
    encoder: &Arc<ImageEncoder>,
    image: ImagePayload,
) -> VisionResult<EncodedImage> {
    let encoder = Arc::clone(encoder);
    tokio::task::spawn_blocking(move || encoder.encode(&image))
        .await
        .unwrap_or_else(|e| Err(VisionError::encode("encode", format!("encoder task failed: {}", e))))
}
