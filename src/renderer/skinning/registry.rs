//! Skinned instance registry (consumer side)
//!
//! [`SkinnedInstances`] owns every render-side [`SkinnedMeshInstance`] and is
//! the only place snapshots are applied. It must be driven from a single
//! context: attach / apply / update / detach are strictly serialized.
//!
//! # Apply order
//!
//! 1. Bounds mode transition (old mechanism torn down before the new one is set up)
//! 2. Skeleton resize and bone fill
//! 3. Blend-shape weights
//! 4. Force-recalculation flag
//! 5. One bounds-changed notification
//!
//! Proxy bounds may lag one frame behind their source when the source is
//! applied after the proxy; no cross-instance ordering is imposed.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{Result, SkinError};
use crate::renderer::settings::SkinSettings;
use crate::renderer::skinning::instance::{ProxyLink, SkinnedMeshInstance};
use crate::renderer::skinning::mode::{BoundsComputationMode, BoundsSource};
use crate::renderer::skinning::observers::{BoundsCallback, ObserverId, ObserverKey};
use crate::renderer::skinning::snapshot::ChangeSnapshot;
use crate::scene::{NodeHandle, RendererId, TransformSource};

#[derive(Debug, Default)]
pub struct SkinnedInstances {
    instances: FxHashMap<RendererId, SkinnedMeshInstance>,
    settings: SkinSettings,
}

impl SkinnedInstances {
    #[must_use]
    pub fn new(settings: SkinSettings) -> Self {
        Self {
            instances: FxHashMap::default(),
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &SkinSettings {
        &self.settings
    }

    #[must_use]
    pub fn get(&self, id: RendererId) -> Option<&SkinnedMeshInstance> {
        self.instances.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: RendererId) -> bool {
        self.instances.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RendererId, &SkinnedMeshInstance)> {
        self.instances.iter()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Creates the render-side instance of a renderer living on `node`.
    ///
    /// Proxies already waiting for `id` as their source are linked to it.
    /// The renderer itself must be marked dirty
    /// ([`SkinnedMeshRenderer::mark_attached`](crate::scene::SkinnedMeshRenderer::mark_attached))
    /// so its next snapshot carries the full state.
    pub fn attach(&mut self, id: RendererId, node: NodeHandle) -> Result<()> {
        if self.instances.contains_key(&id) {
            return Err(SkinError::InstanceAlreadyAttached(id));
        }
        self.instances.insert(id, SkinnedMeshInstance::new(id, node));
        log::debug!("{id}: attached");

        let mut waiting: SmallVec<[RendererId; 4]> = self
            .instances
            .iter()
            .filter(|(_, instance)| instance.awaits_proxy_source(id))
            .map(|(&listener, _)| listener)
            .collect();
        waiting.sort_unstable();

        for listener in waiting {
            self.link_proxy(listener, Some(id));
            log::debug!("{listener}: proxy link to {id} restored");
            self.send_bounds_updated(listener);
        }
        Ok(())
    }

    /// Destroys an instance: severs its proxy link, drops its observers and updater.
    ///
    /// Instances proxying this one keep their last mirrored box, lose their
    /// link and wait for `id` to be attached again.
    pub fn detach(&mut self, id: RendererId) -> Result<()> {
        let mut instance = self.instances.remove(&id).ok_or(SkinError::InstanceNotFound(id))?;

        for listener in instance.observers.proxy_listeners() {
            if let Some(proxy) = self.instances.get_mut(&listener)
                && proxy.mirrors(id)
            {
                proxy.sever_proxy();
            }
        }

        if let Some(link) = instance.release() {
            self.unlink_proxy(id, link);
        }
        log::debug!("{id}: detached");
        Ok(())
    }

    // ========================================================================
    // Apply
    // ========================================================================

    /// Applies one snapshot to the instance of `id`. The snapshot is consumed.
    pub fn apply(&mut self, id: RendererId, snapshot: ChangeSnapshot) -> Result<()> {
        let ChangeSnapshot {
            bounds,
            bounds_changed,
            mesh_changed,
            blend_shape_count,
            skeleton,
            blend_shape_weights,
            ..
        } = snapshot;

        let current = self
            .instances
            .get(&id)
            .ok_or(SkinError::InstanceNotFound(id))?
            .mode();

        if mesh_changed || bounds_changed || current != bounds.mode() {
            self.transition(id, current, bounds);
        }

        if let Some(instance) = self.instances.get_mut(&id) {
            if let Some(skeleton) = skeleton {
                instance.apply_skeleton(skeleton, blend_shape_count);
            }
            if let Some(weights) = blend_shape_weights {
                instance.apply_blend_shape_weights(&weights, blend_shape_count);
            }
            instance.reassert_force_recalculation();
        }

        self.send_bounds_updated(id);
        Ok(())
    }

    fn transition(&mut self, id: RendererId, previous: BoundsComputationMode, source: BoundsSource) {
        let mode = source.mode();
        let Some(instance) = self.instances.get_mut(&id) else {
            return;
        };

        let reconfigure = previous.is_approximate() && mode.is_approximate();
        if !reconfigure
            && let Some(link) = instance.teardown_bounds()
        {
            self.unlink_proxy(id, link);
        }

        match source {
            BoundsSource::Static => {}
            BoundsSource::Explicit(bounds) => {
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.set_explicit_bounds(bounds);
                }
            }
            BoundsSource::Approximate { mode, tables } => {
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.run_updater(mode, tables, &self.settings);
                }
            }
            BoundsSource::Proxy(target) => self.link_proxy(id, target),
        }

        log::debug!("{id}: bounds mode {previous:?} -> {mode:?}");
    }

    // ========================================================================
    // Proxy links
    // ========================================================================

    fn link_proxy(&mut self, id: RendererId, target: Option<RendererId>) {
        let linked = target.filter(|&t| t != id).and_then(|t| {
            let source = self.instances.get_mut(&t)?;
            source.observers.register_proxy(id);
            Some((t, source.local_bounds(), source.bounding_box_available()))
        });

        if linked.is_none()
            && let Some(target) = target
        {
            log::warn!("{id}: proxy bounds source {target} is not available");
        }

        let Some(instance) = self.instances.get_mut(&id) else {
            return;
        };
        match linked {
            Some((source, bounds, available)) => {
                instance.set_proxy(target, Some(ProxyLink { source }));
                instance.mirror(bounds, available);
            }
            None => instance.set_proxy(target.filter(|&t| t != id), None),
        }
    }

    /// Removes `listener`'s subscription on the link source, if the source still exists.
    fn unlink_proxy(&mut self, listener: RendererId, link: ProxyLink) {
        if let Some(source) = self.instances.get_mut(&link.source) {
            source.observers.unregister(ObserverKey::Proxy(listener));
        }
    }

    // ========================================================================
    // Notification
    // ========================================================================

    /// Registers an external bounds-changed callback on `id`.
    pub fn subscribe(&mut self, id: RendererId, callback: BoundsCallback) -> Result<ObserverId> {
        let instance = self.instances.get_mut(&id).ok_or(SkinError::InstanceNotFound(id))?;
        Ok(instance.observers.subscribe(callback))
    }

    pub fn unsubscribe(&mut self, id: RendererId, observer: ObserverId) -> bool {
        self.instances
            .get_mut(&id)
            .is_some_and(|instance| instance.observers.unregister(ObserverKey::External(observer)))
    }

    /// Notifies observers of `id`, forwarding the box to every proxy that still mirrors it.
    /// A notification re-entering an instance that is already notifying is dropped.
    fn send_bounds_updated(&mut self, id: RendererId) {
        let Some(instance) = self.instances.get_mut(&id) else {
            return;
        };
        let Some(proxies) = instance.observers.begin_dispatch() else {
            log::trace!("{id}: re-entrant bounds notification suppressed");
            return;
        };
        let (bounds, available) = (instance.local_bounds(), instance.bounding_box_available());

        for listener in proxies {
            let Some(proxy) = self.instances.get_mut(&listener) else {
                continue;
            };
            if !proxy.mirrors(id) {
                continue;
            }
            proxy.mirror(bounds, available);
            self.send_bounds_updated(listener);
        }

        if let Some(instance) = self.instances.get_mut(&id) {
            instance.observers.end_dispatch();
        }
    }

    // ========================================================================
    // Render flags
    // ========================================================================

    /// Requests matrix recalculation on every render. Sticky until cleared.
    pub fn force_recalculation_per_render(&mut self, id: RendererId) -> Result<()> {
        let instance = self.instances.get_mut(&id).ok_or(SkinError::InstanceNotFound(id))?;
        instance.request_force_recalculation(true);
        Ok(())
    }

    pub fn clear_force_recalculation_per_render(&mut self, id: RendererId) -> Result<()> {
        let instance = self.instances.get_mut(&id).ok_or(SkinError::InstanceNotFound(id))?;
        instance.request_force_recalculation(false);
        Ok(())
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    /// Advances every bounds updater by one frame and notifies instances whose
    /// box changed. Returns how many boxes were republished.
    pub fn update(&mut self, transforms: &dyn TransformSource) -> usize {
        let changed: SmallVec<[RendererId; 8]> = self
            .instances
            .iter_mut()
            .filter_map(|(id, instance)| instance.tick_updater(transforms).then_some(*id))
            .collect();

        for &id in &changed {
            self.send_bounds_updated(id);
        }
        changed.len()
    }
}
