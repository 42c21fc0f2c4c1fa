//! Skinned mesh renderer descriptor (producer side)
//!
//! [`SkinnedMeshRenderer`] is the scene-side view of a skinned mesh: the bounds
//! method the user asked for, the mesh binding, bone list and blend-shape weights.
//! It may be edited from any producer thread through `&self`; every setter
//! records what it touched in an atomic [`ChangeFlags`] cell that
//! [`ChangeSnapshot::capture`](crate::renderer::skinning::ChangeSnapshot::capture)
//! consumes exactly once.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::renderer::skinning::BoundsComputationMode;
use crate::resources::{BoundingBox, ChangeFlags, MeshAsset, SkinChanges};
use crate::scene::NodeHandle;

static NEXT_RENDERER_ID: AtomicU64 = AtomicU64::new(1);

/// Changes a freshly attached instance needs to receive.
const ATTACH_CHANGES: SkinChanges = SkinChanges::MESH
    .union(SkinChanges::BONES)
    .union(SkinChanges::BLEND_SHAPE_WEIGHTS);

/// Identity shared by a scene-side renderer and its render-side instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(u64);

impl RendererId {
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_RENDERER_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SkinnedMesh#{}", self.0)
    }
}

/// Identity of a user driving part of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

/// Editable fields of a skinned mesh renderer.
#[derive(Debug, Clone, Default)]
pub struct SkinnedMeshState {
    pub bounds_compute_method: BoundsComputationMode,
    pub explicit_local_bounds: BoundingBox,
    pub proxy_bounds_source: Option<RendererId>,
    pub mesh: Option<Arc<MeshAsset>>,
    /// Logical bone list, `None` entries are unresolved.
    pub bones: Vec<Option<NodeHandle>>,
    pub root_bone: Option<NodeHandle>,
    pub blend_shape_weights: Vec<f32>,
    /// User whose avatar hierarchy currently drives this renderer.
    pub active_user: Option<UserId>,
}

pub struct SkinnedMeshRenderer {
    id: RendererId,
    node: NodeHandle,
    state: RwLock<SkinnedMeshState>,
    changes: ChangeFlags,
}

impl SkinnedMeshRenderer {
    /// Creates a renderer living on `node`.
    ///
    /// Everything starts dirty so the first snapshot carries the full state.
    #[must_use]
    pub fn new(node: NodeHandle) -> Self {
        Self {
            id: RendererId::next(),
            node,
            state: RwLock::new(SkinnedMeshState::default()),
            changes: ChangeFlags::new(ATTACH_CHANGES),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> RendererId {
        self.id
    }

    /// Node the renderer is attached to.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    pub fn read(&self) -> RwLockReadGuard<'_, SkinnedMeshState> {
        self.state.read()
    }

    /// Marks mesh, bones and blend-shape weights dirty so the snapshot
    /// following an attach carries the full state again.
    pub fn mark_attached(&self) {
        self.changes.mark(ATTACH_CHANGES);
    }

    #[inline]
    #[must_use]
    pub fn pending_changes(&self) -> SkinChanges {
        self.changes.peek()
    }

    pub(crate) fn change_flags(&self) -> &ChangeFlags {
        &self.changes
    }

    /// Runs `edit` under the write lock, then marks `changes`.
    ///
    /// Flags are marked after the data is written, so a capture that sees a
    /// flag also sees the data behind it.
    pub fn edit<R>(&self, changes: SkinChanges, edit: impl FnOnce(&mut SkinnedMeshState) -> R) -> R {
        let result = edit(&mut self.state.write());
        self.changes.mark(changes);
        result
    }

    /// Requested bounds method. Mode differences are detected on the render
    /// side, so no flag is needed.
    pub fn set_bounds_compute_method(&self, mode: BoundsComputationMode) {
        self.state.write().bounds_compute_method = mode;
    }

    pub fn set_explicit_local_bounds(&self, bounds: BoundingBox) {
        self.edit(SkinChanges::EXPLICIT_BOUNDS, |s| s.explicit_local_bounds = bounds);
    }

    pub fn set_proxy_bounds_source(&self, source: Option<RendererId>) {
        self.edit(SkinChanges::PROXY_SOURCE, |s| s.proxy_bounds_source = source);
    }

    pub fn set_mesh(&self, mesh: Option<Arc<MeshAsset>>) {
        self.edit(SkinChanges::MESH, |s| s.mesh = mesh);
    }

    pub fn set_bones(&self, bones: Vec<Option<NodeHandle>>) {
        self.edit(SkinChanges::BONES, |s| s.bones = bones);
    }

    /// Sets a single bone slot, growing the list with unresolved entries if needed.
    pub fn set_bone(&self, index: usize, bone: Option<NodeHandle>) {
        self.edit(SkinChanges::BONES, |s| {
            if s.bones.len() <= index {
                s.bones.resize(index + 1, None);
            }
            s.bones[index] = bone;
        });
    }

    pub fn set_root_bone(&self, root: Option<NodeHandle>) {
        self.edit(SkinChanges::BONES, |s| s.root_bone = root);
    }

    pub fn set_blend_shape_weights(&self, weights: Vec<f32>) {
        self.edit(SkinChanges::BLEND_SHAPE_WEIGHTS, |s| s.blend_shape_weights = weights);
    }

    /// Sets one weight, zero-filling any gap before `index`.
    pub fn set_blend_shape_weight(&self, index: usize, weight: f32) {
        self.edit(SkinChanges::BLEND_SHAPE_WEIGHTS, |s| {
            if s.blend_shape_weights.len() <= index {
                s.blend_shape_weights.resize(index + 1, 0.0);
            }
            s.blend_shape_weights[index] = weight;
        });
    }

    pub fn set_active_user(&self, user: Option<UserId>) {
        self.state.write().active_user = user;
    }
}

impl fmt::Debug for SkinnedMeshRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkinnedMeshRenderer")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("changes", &self.changes.peek())
            .finish_non_exhaustive()
    }
}
