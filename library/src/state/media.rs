//! Asynchronous media resolution.
//!
//! Evaluation never waits for media. A node records a request in its
//! `MediaSlot` and emits a `MediaRequest`; the host resolves it in the
//! background and sends a `MediaResolution` back through the channel. The
//! engine drains the channel at the start of the next evaluation and writes
//! the result into the slot only if the request id still matches.

use log::{debug, warn};
use std::future::Future;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::model::node::NodeId;
use crate::model::value::MediaRef;

#[derive(Debug, Clone, PartialEq)]
pub struct MediaRequest {
    pub node_id: NodeId,
    pub request_id: Uuid,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaResolution {
    pub node_id: NodeId,
    pub request_id: Uuid,
    /// `None` when the descriptor could not be resolved.
    pub media: Option<MediaRef>,
}

/// The outstanding (or answered) media request of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSlot {
    pub descriptor: String,
    pub request_id: Uuid,
    pub resolved: Option<MediaRef>,
    pub failed: bool,
}

impl MediaSlot {
    pub fn new(descriptor: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            request_id: Uuid::new_v4(),
            resolved: None,
            failed: false,
        }
    }

    pub fn request(&self, node_id: NodeId) -> MediaRequest {
        MediaRequest {
            node_id,
            request_id: self.request_id,
            descriptor: self.descriptor.clone(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.resolved.is_none() && !self.failed
    }

    /// Compare-and-set against the stored request id.
    pub fn resolve(&mut self, resolution: &MediaResolution) -> bool {
        if resolution.request_id != self.request_id {
            debug!(
                "Ignoring stale media resolution {} for {}",
                resolution.request_id, resolution.node_id
            );
            return false;
        }
        match &resolution.media {
            Some(media) => {
                self.resolved = Some(media.clone());
                self.failed = false;
            }
            None => {
                warn!("Media '{}' could not be resolved", self.descriptor);
                self.resolved = None;
                self.failed = true;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct MediaResolutionSender(mpsc::UnboundedSender<MediaResolution>);

#[derive(Debug)]
pub struct MediaResolutionReceiver(mpsc::UnboundedReceiver<MediaResolution>);

pub fn media_channel() -> (MediaResolutionSender, MediaResolutionReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MediaResolutionSender(tx), MediaResolutionReceiver(rx))
}

impl MediaResolutionSender {
    /// Returns false if the engine is gone.
    pub fn send(&self, resolution: MediaResolution) -> bool {
        self.0.send(resolution).is_ok()
    }
}

impl MediaResolutionReceiver {
    /// Drains every resolution that has arrived, without blocking.
    pub fn drain(&mut self) -> Vec<MediaResolution> {
        let mut out = Vec::new();
        while let Ok(resolution) = self.0.try_recv() {
            out.push(resolution);
        }
        out
    }
}

/// Runs `resolve` on the tokio runtime and sends its result back to the engine.
pub fn spawn_media_resolution<F>(
    sender: MediaResolutionSender,
    request: MediaRequest,
    resolve: F,
) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = Option<MediaRef>> + Send + 'static,
{
    tokio::spawn(async move {
        let media = resolve.await;
        let delivered = sender.send(MediaResolution {
            node_id: request.node_id,
            request_id: request.request_id,
            media,
        });
        if !delivered {
            debug!("Media resolution for {} dropped, engine is gone", request.node_id);
        }
    })
}
