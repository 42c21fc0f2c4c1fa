//! Change snapshot (capture phase)
//!
//! A [`ChangeSnapshot`] is taken on the producer side from a
//! [`SkinnedMeshRenderer`] and later applied on the render side by
//! [`SkinnedInstances::apply`](super::SkinnedInstances::apply).
//!
//! # Design
//! - Capture is the only place dirty flags are consumed, so every edit is
//!   delivered exactly once.
//! - The snapshot owns everything it carries; nothing in it refers back to
//!   producer-side state.
//! - Bone and weight lists are only copied when they (or the mesh) changed.

use crate::renderer::settings::SkinSettings;
use crate::renderer::skinning::mode::{BoneTables, BoundsComputationMode, BoundsSource};
use crate::resources::SkinChanges;
use crate::scene::{NodeHandle, SkinnedMeshRenderer, UserId};

/// Producer-side policy inputs for [`ChangeSnapshot::capture`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureContext {
    /// The user this process renders for.
    pub local_user: Option<UserId>,
    pub promote_local_static: bool,
}

impl CaptureContext {
    #[must_use]
    pub fn new(local_user: Option<UserId>, settings: &SkinSettings) -> Self {
        Self {
            local_user,
            promote_local_static: settings.promote_local_static,
        }
    }

    fn is_local(&self, user: Option<UserId>) -> bool {
        user.is_some() && user == self.local_user
    }
}

/// Bone binding captured when bones or the mesh changed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonCapture {
    /// Bone count of the bound mesh (0 when no mesh is bound).
    pub bone_count: usize,
    pub bones: Vec<Option<NodeHandle>>,
    pub root_bone: Option<NodeHandle>,
}

/// Immutable description of what changed on a renderer since the previous capture.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSnapshot {
    pub(crate) bounds: BoundsSource,
    pub(crate) bounds_changed: bool,
    pub(crate) mesh_changed: bool,
    pub(crate) bones_changed: bool,
    pub(crate) blend_shape_weights_changed: bool,
    pub(crate) blend_shape_count: usize,
    pub(crate) skeleton: Option<SkeletonCapture>,
    pub(crate) blend_shape_weights: Option<Vec<f32>>,
}

impl ChangeSnapshot {
    /// Captures `renderer` and clears the dirty flags it consulted.
    #[must_use]
    pub fn capture(renderer: &SkinnedMeshRenderer, ctx: &CaptureContext) -> Self {
        let changes = renderer.change_flags().take(SkinChanges::all());
        let state = renderer.read();

        let mut mode = state.bounds_compute_method;
        if mode == BoundsComputationMode::Static
            && ctx.promote_local_static
            && ctx.is_local(state.active_user)
        {
            mode = BoundsComputationMode::FastDisjointRootApproximate;
        }

        let bounds = match (mode, mode.approximation()) {
            (_, Some(approximation)) => BoundsSource::Approximate {
                mode: approximation,
                tables: state
                    .mesh
                    .as_ref()
                    .map(|mesh| BoneTables {
                        mesh: Some(mesh.id),
                        metadata: mesh.bone_metadata.clone(),
                        approximate_bounds: mesh.approximate_bone_bounds.clone(),
                    })
                    .unwrap_or_default(),
            },
            (BoundsComputationMode::Explicit, None) => {
                BoundsSource::Explicit(state.explicit_local_bounds)
            }
            (BoundsComputationMode::Proxy, None) => BoundsSource::Proxy(state.proxy_bounds_source),
            _ => BoundsSource::Static,
        };

        let mesh_changed = changes.contains(SkinChanges::MESH);
        if mesh_changed && let Some(mesh) = &state.mesh {
            log::trace!(
                "{}: capturing mesh '{}' ({} bones, {} blend shapes)",
                renderer.id(),
                mesh.name,
                mesh.bone_count,
                mesh.blend_shape_count
            );
        }
        let bones_changed = changes.contains(SkinChanges::BONES);
        let blend_shape_weights_changed = changes.contains(SkinChanges::BLEND_SHAPE_WEIGHTS);

        let skeleton = (bones_changed || mesh_changed).then(|| SkeletonCapture {
            bone_count: state.mesh.as_ref().map_or(0, |m| m.bone_count),
            bones: state.bones.clone(),
            root_bone: state.root_bone,
        });

        let blend_shape_weights =
            (blend_shape_weights_changed || mesh_changed).then(|| state.blend_shape_weights.clone());

        Self {
            bounds,
            bounds_changed: changes
                .intersects(SkinChanges::PROXY_SOURCE | SkinChanges::EXPLICIT_BOUNDS),
            mesh_changed,
            bones_changed,
            blend_shape_weights_changed,
            blend_shape_count: state.mesh.as_ref().map_or(0, |m| m.blend_shape_count),
            skeleton,
            blend_shape_weights,
        }
    }

    /// Effective mode after local-user promotion.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> BoundsComputationMode {
        self.bounds.mode()
    }

    #[inline]
    #[must_use]
    pub fn bounds_source(&self) -> &BoundsSource {
        &self.bounds
    }

    /// Proxy source or explicit bounds were edited.
    #[inline]
    #[must_use]
    pub fn bounds_changed(&self) -> bool {
        self.bounds_changed
    }

    #[inline]
    #[must_use]
    pub fn mesh_changed(&self) -> bool {
        self.mesh_changed
    }

    #[inline]
    #[must_use]
    pub fn bones_changed(&self) -> bool {
        self.bones_changed
    }

    #[inline]
    #[must_use]
    pub fn blend_shape_weights_changed(&self) -> bool {
        self.blend_shape_weights_changed
    }

    #[inline]
    #[must_use]
    pub fn blend_shape_count(&self) -> usize {
        self.blend_shape_count
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> Option<&SkeletonCapture> {
        self.skeleton.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn blend_shape_weights(&self) -> Option<&[f32]> {
        self.blend_shape_weights.as_deref()
    }
}
