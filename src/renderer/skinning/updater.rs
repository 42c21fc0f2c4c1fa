use crate::renderer::settings::SkinSettings;
use crate::renderer::skinning::approximate::{self, SkinRig};
use crate::renderer::skinning::mode::{ApproximationMode, BoneTables};
use crate::resources::BoundingBox;
use crate::scene::TransformSource;

/// Updater state. Only [`SkinnedInstances::apply`](super::SkinnedInstances::apply)
/// moves an updater between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdaterState {
    #[default]
    Idle,
    FastApprox,
    MediumApprox,
    SlowAccurate,
}

impl From<ApproximationMode> for UpdaterState {
    fn from(mode: ApproximationMode) -> Self {
        match mode {
            ApproximationMode::FastDisjointRoot => Self::FastApprox,
            ApproximationMode::MediumPerBone => Self::MediumApprox,
            ApproximationMode::SlowRealtimeAccurate => Self::SlowAccurate,
        }
    }
}

/// Per-instance worker recomputing approximate bounds on a frame cadence.
#[derive(Debug, Default)]
pub struct SkinBoundsUpdater {
    state: UpdaterState,
    tables: BoneTables,
    interval: u32,
    frames_until_update: u32,
    padding: f32,
    last_bounds: Option<BoundingBox>,
}

impl SkinBoundsUpdater {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches to `mode` with fresh tables. The next tick recomputes.
    ///
    /// Re-configuring the running mode with tables of the same mesh keeps the
    /// current cadence and last published box. Returns whether tables were reloaded.
    pub fn configure(&mut self, mode: ApproximationMode, tables: BoneTables, settings: &SkinSettings) -> bool {
        let state = UpdaterState::from(mode);
        self.interval = settings.interval_for(mode);
        self.padding = settings.bounds_padding;

        if self.state == state && tables.mesh.is_some() && self.tables.mesh == tables.mesh {
            self.frames_until_update = self.frames_until_update.min(self.interval.saturating_sub(1));
            return false;
        }

        self.state = state;
        self.tables = tables;
        self.frames_until_update = 0;
        true
    }

    /// Returns to `Idle` and releases the tables.
    pub fn stop(&mut self) {
        self.state = UpdaterState::Idle;
        self.tables = BoneTables::default();
        self.last_bounds = None;
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> UpdaterState {
        self.state
    }

    #[must_use]
    pub fn mode(&self) -> Option<ApproximationMode> {
        match self.state {
            UpdaterState::Idle => None,
            UpdaterState::FastApprox => Some(ApproximationMode::FastDisjointRoot),
            UpdaterState::MediumApprox => Some(ApproximationMode::MediumPerBone),
            UpdaterState::SlowAccurate => Some(ApproximationMode::SlowRealtimeAccurate),
        }
    }

    #[inline]
    #[must_use]
    pub fn tables(&self) -> &BoneTables {
        &self.tables
    }

    /// Frames between recomputations in the current state.
    #[inline]
    #[must_use]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Advances one frame. Returns the new box when a recomputation ran and
    /// produced a box different from the last published one.
    pub fn tick(&mut self, rig: &SkinRig<'_>, transforms: &dyn TransformSource) -> Option<BoundingBox> {
        if self.state == UpdaterState::Idle {
            return None;
        }

        if self.frames_until_update > 0 {
            self.frames_until_update -= 1;
            return None;
        }
        self.frames_until_update = self.interval.saturating_sub(1);

        let computed = match self.state {
            UpdaterState::Idle => None,
            UpdaterState::FastApprox => {
                approximate::fast_disjoint_root(&self.tables.approximate_bounds, rig, transforms)
            }
            UpdaterState::MediumApprox | UpdaterState::SlowAccurate => {
                approximate::per_bone(&self.tables.metadata, rig, transforms)
            }
        }?;

        let bounds = if self.padding > 0.0 { computed.pad(self.padding) } else { computed };

        if self.last_bounds == Some(bounds) {
            return None;
        }

        log::trace!("Skin bounds recomputed ({:?}): {:?}", self.state, bounds);
        self.last_bounds = Some(bounds);
        Some(bounds)
    }
}
