//! Fire-and-forget conversion queue.
//!
//! The [`ConversionQueue`] accepts [`ConversionJob`] submissions without
//! blocking and forwards them from a spawned background task to the tiling
//! pipeline's HTTP intake. Conversions are idempotent on the pipeline side, so
//! a duplicate submission is harmless.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Channel capacity for pending jobs.
const QUEUE_CAPACITY: usize = 256;

/// What the pipeline should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Tile pyramid for an image.
    Tiles,
    /// Poster frame for audio or video.
    Poster,
}

/// A request to convert one source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionJob {
    pub url: String,
    pub quality: u8,
    pub refresh: bool,
    pub kind: JobKind,
}

/// Handle to the background submission task.
#[derive(Debug, Clone)]
pub struct ConversionQueue {
    sender: mpsc::Sender<ConversionJob>,
}

impl ConversionQueue {
    /// Create the queue and spawn its forwarding task.
    ///
    /// With no `queue_url` jobs are logged and dropped.
    pub fn new(client: reqwest::Client, queue_url: Option<String>) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(forward_jobs(receiver, client, queue_url));
        Self { sender }
    }

    /// A queue whose jobs land in the returned receiver.
    pub fn channel() -> (Self, mpsc::Receiver<ConversionJob>) {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        (Self { sender }, receiver)
    }

    /// Submit without waiting. A full or closed queue drops the job.
    pub fn submit(&self, job: ConversionJob) {
        info!(url = %job.url, kind = ?job.kind, refresh = job.refresh, "Queueing conversion");
        if let Err(e) = self.sender.try_send(job) {
            warn!(error = %e, "Conversion queue rejected job");
        }
    }
}

async fn forward_jobs(
    mut receiver: mpsc::Receiver<ConversionJob>,
    client: reqwest::Client,
    queue_url: Option<String>,
) {
    debug!("Conversion queue worker started");

    while let Some(job) = receiver.recv().await {
        let Some(queue_url) = queue_url.as_deref() else {
            debug!(url = %job.url, "No queue configured; dropping conversion job");
            continue;
        };
        match client.post(queue_url).json(&job).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(url = %job.url, "Conversion job accepted");
            }
            Ok(resp) => {
                warn!(url = %job.url, status = resp.status().as_u16(), "Conversion intake refused job");
            }
            Err(e) => {
                warn!(url = %job.url, error = %e, "Conversion intake unreachable");
            }
        }
    }

    debug!("Conversion queue worker stopped (channel closed)");
}
