//! Skinning Settings
//!
//! Tuning knobs for skinned-mesh bounds computation.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_skin::renderer::SkinSettings;
//!
//! // Defaults: fast bounds every 8 frames, medium every 2, slow every frame
//! let settings = SkinSettings::default();
//!
//! // Tighter fast cadence, no local-user promotion
//! let settings = SkinSettings {
//!     fast_interval_frames: 4,
//!     promote_local_static: false,
//!     ..Default::default()
//! };
//! ```

use crate::renderer::skinning::ApproximationMode;

/// Configuration shared by every skinned instance of a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinSettings {
    /// Frames between two `FastDisjointRootApproximate` recomputations.
    pub fast_interval_frames: u32,
    /// Frames between two `MediumPerBoneApproximate` recomputations.
    pub medium_interval_frames: u32,
    /// Relative padding applied to every approximated box (0.1 = 10% of its size per side).
    pub bounds_padding: f32,
    /// When set, a `Static` request on content driven by the local user is
    /// captured as `FastDisjointRootApproximate`.
    pub promote_local_static: bool,
}

impl Default for SkinSettings {
    fn default() -> Self {
        Self {
            fast_interval_frames: 8,
            medium_interval_frames: 2,
            bounds_padding: 0.0,
            promote_local_static: true,
        }
    }
}

impl SkinSettings {
    /// Recompute cadence for `mode`, in frames. Never zero.
    #[inline]
    #[must_use]
    pub fn interval_for(&self, mode: ApproximationMode) -> u32 {
        match mode {
            ApproximationMode::FastDisjointRoot => self.fast_interval_frames.max(1),
            ApproximationMode::MediumPerBone => self.medium_interval_frames.max(1),
            ApproximationMode::SlowRealtimeAccurate => 1,
        }
    }
}
