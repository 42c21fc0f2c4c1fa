//! Bounds computation modes and their per-mode payloads.

use uuid::Uuid;

use crate::resources::{ApproximateBoneBounds, BoneMetadata, BoundingBox};
use crate::scene::RendererId;

/// Strategy a skinned instance uses to obtain its local bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundsComputationMode {
    /// Use the mesh's authored bounds; nothing is computed.
    #[default]
    Static,
    /// Mirror the bounds of another skinned instance.
    Proxy,
    /// Use a fixed, user-provided box.
    Explicit,
    /// One sphere per disjoint bone subtree, recomputed rarely.
    FastDisjointRootApproximate,
    /// One box per weighted bone, recomputed often.
    MediumPerBoneApproximate,
    /// Per-bone boxes every frame; the renderer also skins while offscreen.
    SlowRealtimeAccurate,
}

impl BoundsComputationMode {
    /// The approximation flavour, if this mode is computed by a bounds updater.
    #[inline]
    #[must_use]
    pub fn approximation(self) -> Option<ApproximationMode> {
        match self {
            Self::FastDisjointRootApproximate => Some(ApproximationMode::FastDisjointRoot),
            Self::MediumPerBoneApproximate => Some(ApproximationMode::MediumPerBone),
            Self::SlowRealtimeAccurate => Some(ApproximationMode::SlowRealtimeAccurate),
            Self::Static | Self::Proxy | Self::Explicit => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_approximate(self) -> bool {
        self.approximation().is_some()
    }
}

/// Subset of [`BoundsComputationMode`] driven by a [`SkinBoundsUpdater`](super::SkinBoundsUpdater).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApproximationMode {
    FastDisjointRoot,
    MediumPerBone,
    SlowRealtimeAccurate,
}

impl From<ApproximationMode> for BoundsComputationMode {
    fn from(mode: ApproximationMode) -> Self {
        match mode {
            ApproximationMode::FastDisjointRoot => Self::FastDisjointRootApproximate,
            ApproximationMode::MediumPerBone => Self::MediumPerBoneApproximate,
            ApproximationMode::SlowRealtimeAccurate => Self::SlowRealtimeAccurate,
        }
    }
}

/// Static per-bone tables copied out of a mesh asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTables {
    /// Identity of the mesh the tables came from. Mesh assets are immutable,
    /// so equal ids mean equal tables.
    pub mesh: Option<Uuid>,
    pub metadata: Vec<BoneMetadata>,
    pub approximate_bounds: Vec<ApproximateBoneBounds>,
}

/// A requested bounds mode together with exactly the data that mode needs.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundsSource {
    Static,
    Explicit(BoundingBox),
    /// Target renderer; `None` when the proxy source is unset.
    Proxy(Option<RendererId>),
    Approximate {
        mode: ApproximationMode,
        tables: BoneTables,
    },
}

impl BoundsSource {
    #[must_use]
    pub fn mode(&self) -> BoundsComputationMode {
        match self {
            Self::Static => BoundsComputationMode::Static,
            Self::Explicit(_) => BoundsComputationMode::Explicit,
            Self::Proxy(_) => BoundsComputationMode::Proxy,
            Self::Approximate { mode, .. } => (*mode).into(),
        }
    }
}
