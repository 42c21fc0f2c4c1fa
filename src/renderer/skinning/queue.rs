//! Producer → consumer hand-off
//!
//! Snapshots cross from the scene side to the render side through an
//! unbounded flume channel. Any number of producer threads may hold a
//! [`SkinSyncSender`]; the render context drains the single
//! [`SkinSyncReceiver`] once per frame with [`SkinnedInstances::drain`].

use crate::errors::{Result, SkinError};
use crate::renderer::skinning::registry::SkinnedInstances;
use crate::renderer::skinning::snapshot::{CaptureContext, ChangeSnapshot};
use crate::scene::{NodeHandle, RendererId, SkinnedMeshRenderer};

#[derive(Debug)]
pub enum SkinSyncMessage {
    Attach { id: RendererId, node: NodeHandle },
    Apply { id: RendererId, snapshot: Box<ChangeSnapshot> },
    Detach { id: RendererId },
}

impl SkinSyncMessage {
    #[must_use]
    pub fn id(&self) -> RendererId {
        match self {
            Self::Attach { id, .. } | Self::Apply { id, .. } | Self::Detach { id } => *id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkinSyncSender {
    tx: flume::Sender<SkinSyncMessage>,
}

#[derive(Debug)]
pub struct SkinSyncReceiver {
    rx: flume::Receiver<SkinSyncMessage>,
}

/// Creates a connected sender / receiver pair.
#[must_use]
pub fn skin_sync_queue() -> (SkinSyncSender, SkinSyncReceiver) {
    let (tx, rx) = flume::unbounded();
    (SkinSyncSender { tx }, SkinSyncReceiver { rx })
}

impl SkinSyncSender {
    pub fn send(&self, message: SkinSyncMessage) -> Result<()> {
        self.tx.send(message).map_err(|_| SkinError::QueueDisconnected)
    }

    /// Queues an attach and marks `renderer` dirty for its next [`submit`](Self::submit).
    pub fn attach(&self, renderer: &SkinnedMeshRenderer) -> Result<()> {
        renderer.mark_attached();
        self.send(SkinSyncMessage::Attach { id: renderer.id(), node: renderer.node() })
    }

    /// Captures `renderer` (clearing its dirty flags) and queues the snapshot.
    pub fn submit(&self, renderer: &SkinnedMeshRenderer, ctx: &CaptureContext) -> Result<()> {
        let snapshot = ChangeSnapshot::capture(renderer, ctx);
        self.send(SkinSyncMessage::Apply { id: renderer.id(), snapshot: Box::new(snapshot) })
    }

    pub fn detach(&self, id: RendererId) -> Result<()> {
        self.send(SkinSyncMessage::Detach { id })
    }
}

impl SkinSyncReceiver {
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl SkinnedInstances {
    /// Handles one message. Errors describe messages addressing a missing
    /// (or already attached) instance.
    pub fn handle(&mut self, message: SkinSyncMessage) -> Result<()> {
        match message {
            SkinSyncMessage::Attach { id, node } => self.attach(id, node),
            SkinSyncMessage::Apply { id, snapshot } => self.apply(id, *snapshot),
            SkinSyncMessage::Detach { id } => self.detach(id),
        }
    }

    /// Applies every queued message in order. Failing messages are logged
    /// and skipped. Returns how many messages were handled successfully.
    pub fn drain(&mut self, receiver: &SkinSyncReceiver) -> usize {
        let mut handled = 0;
        for message in receiver.rx.try_iter() {
            let id = message.id();
            match self.handle(message) {
                Ok(()) => handled += 1,
                Err(err) => log::warn!("Dropping skin sync message for {id}: {err}"),
            }
        }
        handled
    }
}
