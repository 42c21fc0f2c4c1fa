//! Skinned mesh bounds & skeleton synchronization
//!
//! Two-phase protocol between the scene (producer) side and the render (consumer) side:
//!
//! ```text
//! SkinnedMeshRenderer ──capture──▶ ChangeSnapshot ──queue──▶ SkinnedInstances::apply ──▶ SkinnedMeshInstance
//!   (dirty flags)                   (immutable)                (mode transition,           (bones, weights,
//!                                                               resize, notify)             bounds, updater)
//! ```
//!
//! - `mode`: bounds computation modes and per-mode payloads
//! - `snapshot`: capture of producer state
//! - `approximate`: approximate bounds from static bone tables
//! - `updater`: per-instance cadence driven bounds recomputation
//! - `observers`: bounds-changed observer registry with re-entrancy guard
//! - `instance`: render-side instance state
//! - `registry`: apply, proxy links, per-frame update
//! - `queue`: producer → consumer channel

pub mod approximate;
pub mod instance;
pub mod mode;
pub mod observers;
pub mod queue;
pub mod registry;
pub mod snapshot;
pub mod updater;

pub use approximate::SkinRig;
pub use instance::{ActiveBounds, ProxyLink, SkinnedMeshInstance};
pub use mode::{ApproximationMode, BoneTables, BoundsComputationMode, BoundsSource};
pub use observers::{BoundsCallback, ObserverId, ObserverKey};
pub use queue::{SkinSyncMessage, SkinSyncReceiver, SkinSyncSender, skin_sync_queue};
pub use registry::SkinnedInstances;
pub use snapshot::{CaptureContext, ChangeSnapshot, SkeletonCapture};
pub use updater::{SkinBoundsUpdater, UpdaterState};
