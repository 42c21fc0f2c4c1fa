//! Render-side skinned mesh state.

use crate::renderer::settings::SkinSettings;
use crate::renderer::skinning::approximate::SkinRig;
use crate::renderer::skinning::mode::{ApproximationMode, BoneTables, BoundsComputationMode};
use crate::renderer::skinning::observers::BoundsObservers;
use crate::renderer::skinning::snapshot::SkeletonCapture;
use crate::renderer::skinning::updater::{SkinBoundsUpdater, UpdaterState};
use crate::resources::BoundingBox;
use crate::scene::{NodeHandle, RendererId, TransformSource};

/// Non-owning link to the instance whose bounds are mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyLink {
    pub source: RendererId,
}

/// The active bounds mechanism. Holding it as one value keeps "at most one
/// of updater / proxy link" true by construction.
#[derive(Debug, Default)]
pub enum ActiveBounds {
    #[default]
    Static,
    Explicit,
    /// `None` while the proxy target is unset, absent or detached.
    Proxy(Option<ProxyLink>),
    Approximate(SkinBoundsUpdater),
}

impl ActiveBounds {
    #[must_use]
    pub fn mode(&self) -> BoundsComputationMode {
        match self {
            Self::Static => BoundsComputationMode::Static,
            Self::Explicit => BoundsComputationMode::Explicit,
            Self::Proxy(_) => BoundsComputationMode::Proxy,
            Self::Approximate(updater) => updater
                .mode()
                .map_or(BoundsComputationMode::Static, Into::into),
        }
    }
}

/// What a skinned renderer looks like from the render context.
#[derive(Debug)]
pub struct SkinnedMeshInstance {
    id: RendererId,
    node: NodeHandle,

    pub(crate) active: ActiveBounds,
    /// Requested proxy source, kept while the link itself is down.
    proxy_target: Option<RendererId>,

    // === Renderer-facing state ===
    bones: Vec<Option<NodeHandle>>,
    root_bone: Option<NodeHandle>,
    blend_shape_weights: Vec<f32>,
    local_bounds: BoundingBox,
    bounding_box_available: bool,
    update_when_offscreen: bool,
    force_matrix_recalculation_per_render: bool,

    /// Sticky request, only cleared explicitly.
    force_recalc_requested: bool,

    pub(crate) observers: BoundsObservers,
}

impl SkinnedMeshInstance {
    #[must_use]
    pub fn new(id: RendererId, node: NodeHandle) -> Self {
        Self {
            id,
            node,
            active: ActiveBounds::Static,
            proxy_target: None,
            bones: Vec::new(),
            root_bone: None,
            blend_shape_weights: Vec::new(),
            local_bounds: BoundingBox::default(),
            bounding_box_available: false,
            update_when_offscreen: false,
            force_matrix_recalculation_per_render: false,
            force_recalc_requested: false,
            observers: BoundsObservers::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn id(&self) -> RendererId {
        self.id
    }

    /// The instance's own node.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> BoundsComputationMode {
        self.active.mode()
    }

    #[must_use]
    pub fn updater(&self) -> Option<&SkinBoundsUpdater> {
        match &self.active {
            ActiveBounds::Approximate(updater) => Some(updater),
            _ => None,
        }
    }

    #[must_use]
    pub fn proxy_link(&self) -> Option<ProxyLink> {
        match self.active {
            ActiveBounds::Proxy(link) => link,
            _ => None,
        }
    }

    /// The renderer this instance wants to mirror, linked or not.
    #[inline]
    #[must_use]
    pub fn proxy_target(&self) -> Option<RendererId> {
        self.proxy_target
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Option<NodeHandle>] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn root_bone(&self) -> Option<NodeHandle> {
        self.root_bone
    }

    #[inline]
    #[must_use]
    pub fn blend_shape_weights(&self) -> &[f32] {
        &self.blend_shape_weights
    }

    #[inline]
    #[must_use]
    pub fn blend_shape_weight(&self, index: usize) -> Option<f32> {
        self.blend_shape_weights.get(index).copied()
    }

    #[inline]
    #[must_use]
    pub fn local_bounds(&self) -> BoundingBox {
        self.local_bounds
    }

    #[inline]
    #[must_use]
    pub fn bounding_box_available(&self) -> bool {
        self.bounding_box_available
    }

    /// Whether the renderer keeps skinning while outside the view frustum.
    #[inline]
    #[must_use]
    pub fn update_when_offscreen(&self) -> bool {
        self.update_when_offscreen
    }

    #[inline]
    #[must_use]
    pub fn force_matrix_recalculation_per_render(&self) -> bool {
        self.force_matrix_recalculation_per_render
    }

    #[inline]
    #[must_use]
    pub fn force_recalculation_requested(&self) -> bool {
        self.force_recalc_requested
    }

    #[inline]
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ========================================================================
    // Mode transition helpers (driven by SkinnedInstances)
    // ========================================================================

    /// Dismantles the current mechanism and falls back to `Static`.
    /// Returns the severed proxy link so the caller can unsubscribe from its source.
    pub(crate) fn teardown_bounds(&mut self) -> Option<ProxyLink> {
        let previous = std::mem::take(&mut self.active);
        self.proxy_target = None;
        self.bounding_box_available = false;
        self.update_when_offscreen = false;

        match previous {
            ActiveBounds::Approximate(mut updater) => {
                updater.stop();
                None
            }
            ActiveBounds::Proxy(link) => link,
            ActiveBounds::Static | ActiveBounds::Explicit => None,
        }
    }

    pub(crate) fn set_explicit_bounds(&mut self, bounds: BoundingBox) {
        self.active = ActiveBounds::Explicit;
        self.local_bounds = bounds;
        self.bounding_box_available = true;
    }

    /// Starts an updater, or reconfigures the running one in place.
    pub(crate) fn run_updater(&mut self, mode: ApproximationMode, tables: BoneTables, settings: &SkinSettings) {
        if let ActiveBounds::Approximate(updater) = &mut self.active {
            if !updater.configure(mode, tables, settings) {
                log::trace!("{}: bounds updater kept its tables", self.id);
            }
        } else {
            let mut updater = SkinBoundsUpdater::new();
            updater.configure(mode, tables, settings);
            self.active = ActiveBounds::Approximate(updater);
            self.bounding_box_available = false;
        }
        self.update_when_offscreen = self
            .updater()
            .is_some_and(|u| u.state() == UpdaterState::SlowAccurate);
    }

    pub(crate) fn set_proxy(&mut self, target: Option<RendererId>, link: Option<ProxyLink>) {
        self.active = ActiveBounds::Proxy(link);
        self.proxy_target = target;
    }

    /// Drops a link whose source went away. The target is kept so the link
    /// can be restored when the source is attached again.
    pub(crate) fn sever_proxy(&mut self) {
        if let ActiveBounds::Proxy(link) = &mut self.active {
            *link = None;
        }
    }

    /// Whether this instance is in proxy mode, unlinked, and waiting for `source`.
    #[must_use]
    pub(crate) fn awaits_proxy_source(&self, source: RendererId) -> bool {
        matches!(self.active, ActiveBounds::Proxy(None)) && self.proxy_target == Some(source)
    }

    /// Whether this instance currently mirrors `source`.
    #[must_use]
    pub(crate) fn mirrors(&self, source: RendererId) -> bool {
        self.proxy_link().is_some_and(|link| link.source == source)
    }

    pub(crate) fn mirror(&mut self, bounds: BoundingBox, available: bool) {
        self.local_bounds = bounds;
        self.bounding_box_available = available;
    }

    // ========================================================================
    // Skeleton / blend shapes
    // ========================================================================

    /// Resizes and fills the bone array from a captured skeleton.
    ///
    /// A mesh with no bones but some blend shapes gets exactly one bone, bound
    /// to the instance's own node, which is also used as root bone.
    pub(crate) fn apply_skeleton(&mut self, skeleton: SkeletonCapture, blend_shape_count: usize) {
        let boneless = skeleton.bone_count == 0 && blend_shape_count > 0;
        let target_len = if boneless { 1 } else { skeleton.bone_count };

        self.bones.resize(target_len, None);

        if boneless {
            self.bones[0] = Some(self.node);
            self.root_bone = Some(self.node);
            return;
        }

        for (slot, bone) in self.bones.iter_mut().zip(skeleton.bones) {
            if let Some(bone) = bone {
                *slot = Some(bone);
            }
        }
        self.root_bone = skeleton.root_bone;
    }

    /// Writes weights positionally and zeroes every slot past the provided list.
    pub(crate) fn apply_blend_shape_weights(&mut self, weights: &[f32], blend_shape_count: usize) {
        self.blend_shape_weights.resize(blend_shape_count, 0.0);

        let provided = blend_shape_count.min(weights.len());
        self.blend_shape_weights[..provided].copy_from_slice(&weights[..provided]);
        self.blend_shape_weights[provided..].fill(0.0);
    }

    pub(crate) fn request_force_recalculation(&mut self, enabled: bool) {
        self.force_recalc_requested = enabled;
        self.force_matrix_recalculation_per_render = enabled;
    }

    pub(crate) fn reassert_force_recalculation(&mut self) {
        if self.force_recalc_requested {
            self.force_matrix_recalculation_per_render = true;
        }
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    /// Advances the updater one frame. Returns `true` when a new box was published.
    pub(crate) fn tick_updater(&mut self, transforms: &dyn TransformSource) -> bool {
        let ActiveBounds::Approximate(updater) = &mut self.active else {
            return false;
        };

        let rig = SkinRig { node: self.node, bones: &self.bones };
        let Some(bounds) = updater.tick(&rig, transforms) else {
            return false;
        };

        self.local_bounds = bounds;
        self.bounding_box_available = true;
        true
    }

    /// Releases everything on detach.
    pub(crate) fn release(&mut self) -> Option<ProxyLink> {
        let link = self.teardown_bounds();
        self.observers.clear();
        self.bones.clear();
        self.root_bone = None;
        link
    }
}
