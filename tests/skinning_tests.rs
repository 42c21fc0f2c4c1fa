//! Skinned Instance Apply Tests
//!
//! Tests for:
//! - Bounds mode transitions (one mechanism at a time, teardown before setup)
//! - Explicit / Proxy / approximate modes
//! - Skeleton resize, boneless blend-shape meshes, unresolved bones
//! - Blend-shape weight writes and zero fill
//! - Notification count, re-entrancy between mutual proxies
//! - Detach / re-attach, force-recalculation flag, sync queue

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;

use myth_skin::errors::SkinError;
use myth_skin::renderer::SkinSettings;
use myth_skin::renderer::skinning::{
    BoundsComputationMode, CaptureContext, ChangeSnapshot, SkinnedInstances, UpdaterState,
    skin_sync_queue,
};
use myth_skin::resources::{ApproximateBoneBounds, BoneMetadata, BoundingBox, MeshAsset};
use myth_skin::scene::{NodeHandle, RendererId, SceneGraph, SkinnedMeshRenderer};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn unit_box() -> BoundingBox {
    BoundingBox::new(Vec3::ZERO, Vec3::ONE)
}

fn mesh(bones: usize, blend_shapes: usize) -> Arc<MeshAsset> {
    let metadata = (0..bones)
        .map(|_| BoneMetadata {
            bounds: BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
            weighted_vertices: 8,
        })
        .collect();
    let roots = if bones > 0 {
        vec![ApproximateBoneBounds { root_bone_index: 0, center: Vec3::ZERO, radius: 2.0 }]
    } else {
        Vec::new()
    };
    Arc::new(
        MeshAsset::new("Body", bones, blend_shapes)
            .with_bone_metadata(metadata)
            .with_approximate_bounds(roots),
    )
}

/// Counts bounds-changed notifications of one instance.
fn watch(instances: &mut SkinnedInstances, id: RendererId) -> Arc<AtomicU32> {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&hits);
    instances
        .subscribe(id, Box::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();
    hits
}

struct World {
    graph: SceneGraph,
    instances: SkinnedInstances,
    ctx: CaptureContext,
}

impl World {
    fn new() -> Self {
        init_logger();
        Self {
            graph: SceneGraph::new(),
            instances: SkinnedInstances::default(),
            ctx: CaptureContext::default(),
        }
    }

    fn spawn(&mut self) -> SkinnedMeshRenderer {
        let node = self.graph.create_node();
        let renderer = SkinnedMeshRenderer::new(node);
        self.instances.attach(renderer.id(), node).unwrap();
        renderer
    }

    fn bone(&mut self, parent: NodeHandle, position: Vec3) -> NodeHandle {
        let bone = self.graph.create_node();
        self.graph.attach(bone, parent);
        self.graph.get_node_mut(bone).unwrap().transform.position = position;
        bone
    }

    fn sync(&mut self, renderer: &SkinnedMeshRenderer) {
        let snapshot = ChangeSnapshot::capture(renderer, &self.ctx);
        self.instances.apply(renderer.id(), snapshot).unwrap();
    }

    fn frame(&mut self) -> usize {
        self.graph.update_world_matrices();
        self.instances.update(&self.graph)
    }
}

// ============================================================================
// Mode Transitions
// ============================================================================

#[test]
fn explicit_mode_sets_box_without_updater() {
    let mut world = World::new();
    let renderer = world.spawn();
    renderer.set_bounds_compute_method(BoundsComputationMode::Explicit);
    renderer.set_explicit_local_bounds(unit_box());

    world.sync(&renderer);

    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.mode(), BoundsComputationMode::Explicit);
    assert!(instance.bounding_box_available());
    assert_eq!(instance.local_bounds(), unit_box());
    assert!(instance.updater().is_none());
    assert!(instance.proxy_link().is_none());
}

#[test]
fn approximate_mode_allocates_single_updater() {
    let mut world = World::new();
    let renderer = world.spawn();
    renderer.set_mesh(Some(mesh(2, 0)));
    renderer.set_bounds_compute_method(BoundsComputationMode::MediumPerBoneApproximate);

    world.sync(&renderer);

    let instance = world.instances.get(renderer.id()).unwrap();
    let updater = instance.updater().unwrap();
    assert_eq!(updater.state(), UpdaterState::MediumApprox);
    assert_eq!(updater.tables().metadata.len(), 2);
    assert!(!instance.bounding_box_available());
    assert!(!instance.update_when_offscreen());
}

#[test]
fn approximate_to_approximate_reconfigures_in_place() {
    let mut world = World::new();
    let renderer = world.spawn();
    renderer.set_mesh(Some(mesh(1, 0)));
    renderer.set_bounds_compute_method(BoundsComputationMode::FastDisjointRootApproximate);
    world.sync(&renderer);

    renderer.set_bounds_compute_method(BoundsComputationMode::SlowRealtimeAccurate);
    world.sync(&renderer);

    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.mode(), BoundsComputationMode::SlowRealtimeAccurate);
    assert_eq!(instance.updater().unwrap().state(), UpdaterState::SlowAccurate);
    assert!(instance.update_when_offscreen());
}

#[test]
fn leaving_approximation_tears_updater_down() {
    let mut world = World::new();
    let renderer = world.spawn();
    renderer.set_mesh(Some(mesh(1, 0)));
    renderer.set_bounds_compute_method(BoundsComputationMode::SlowRealtimeAccurate);
    world.sync(&renderer);
    assert!(world.instances.get(renderer.id()).unwrap().update_when_offscreen());

    renderer.set_bounds_compute_method(BoundsComputationMode::Static);
    world.sync(&renderer);

    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.mode(), BoundsComputationMode::Static);
    assert!(instance.updater().is_none());
    assert!(!instance.update_when_offscreen());
    assert!(!instance.bounding_box_available());
}

#[test]
fn every_mode_sequence_keeps_one_mechanism() {
    let mut world = World::new();
    let source = world.spawn();
    let renderer = world.spawn();
    renderer.set_mesh(Some(mesh(1, 0)));
    renderer.set_proxy_bounds_source(Some(source.id()));
    world.sync(&source);

    let sequence = [
        BoundsComputationMode::FastDisjointRootApproximate,
        BoundsComputationMode::Proxy,
        BoundsComputationMode::MediumPerBoneApproximate,
        BoundsComputationMode::Explicit,
        BoundsComputationMode::Proxy,
        BoundsComputationMode::Static,
        BoundsComputationMode::SlowRealtimeAccurate,
        BoundsComputationMode::Proxy,
    ];

    for mode in sequence {
        renderer.set_bounds_compute_method(mode);
        world.sync(&renderer);

        let instance = world.instances.get(renderer.id()).unwrap();
        assert_eq!(instance.mode(), mode);
        assert_eq!(instance.updater().is_some(), mode.is_approximate());
        assert_eq!(instance.proxy_link().is_some(), mode == BoundsComputationMode::Proxy);

        let subscribed = world
            .instances
            .get(source.id())
            .unwrap()
            .observer_count();
        assert_eq!(subscribed, usize::from(mode == BoundsComputationMode::Proxy));
    }
}

// ============================================================================
// Approximate Bounds Updates
// ============================================================================

#[test]
fn updater_publishes_bounds_and_notifies() {
    let mut world = World::new();
    let renderer = world.spawn();
    let hips = world.bone(renderer.node(), Vec3::new(0.0, 1.0, 0.0));
    renderer.set_mesh(Some(mesh(1, 0)));
    renderer.set_bones(vec![Some(hips)]);
    renderer.set_bounds_compute_method(BoundsComputationMode::MediumPerBoneApproximate);
    world.sync(&renderer);

    let hits = watch(&mut world.instances, renderer.id());
    assert_eq!(world.frame(), 1);

    let instance = world.instances.get(renderer.id()).unwrap();
    assert!(instance.bounding_box_available());
    assert_eq!(
        instance.local_bounds(),
        BoundingBox::new(Vec3::new(-0.5, 0.5, -0.5), Vec3::new(0.5, 1.5, 0.5))
    );
    assert_eq!(hits.load(Ordering::Relaxed), 1);

    // Unchanged pose: nothing republished
    world.frame();
    world.frame();
    assert_eq!(hits.load(Ordering::Relaxed), 1);
}

#[test]
fn fast_mode_respects_cadence() {
    let mut world = World::new();
    world.instances = SkinnedInstances::new(SkinSettings { fast_interval_frames: 4, ..Default::default() });
    let renderer = world.spawn();
    let hips = world.bone(renderer.node(), Vec3::ZERO);
    renderer.set_mesh(Some(mesh(1, 0)));
    renderer.set_bones(vec![Some(hips)]);
    renderer.set_bounds_compute_method(BoundsComputationMode::FastDisjointRootApproximate);
    world.sync(&renderer);

    assert_eq!(world.frame(), 1);
    world.graph.get_node_mut(hips).unwrap().transform.position = Vec3::X;
    assert_eq!(world.frame(), 0);
    assert_eq!(world.frame(), 0);
    assert_eq!(world.frame(), 0);
    assert_eq!(world.frame(), 1);

    let bounds = world.instances.get(renderer.id()).unwrap().local_bounds();
    assert_eq!(bounds, BoundingBox::new(Vec3::new(-1.0, -2.0, -2.0), Vec3::new(3.0, 2.0, 2.0)));
}

// ============================================================================
// Proxy
// ============================================================================

#[test]
fn proxy_pulls_and_follows_source_bounds() {
    let mut world = World::new();
    let source = world.spawn();
    let proxy = world.spawn();

    source.set_bounds_compute_method(BoundsComputationMode::Explicit);
    source.set_explicit_local_bounds(unit_box());
    world.sync(&source);

    proxy.set_bounds_compute_method(BoundsComputationMode::Proxy);
    proxy.set_proxy_bounds_source(Some(source.id()));
    world.sync(&proxy);

    let instance = world.instances.get(proxy.id()).unwrap();
    assert_eq!(instance.proxy_link().unwrap().source, source.id());
    assert_eq!(instance.local_bounds(), unit_box());
    assert!(instance.bounding_box_available());

    let bigger = BoundingBox::new(Vec3::splat(-2.0), Vec3::splat(2.0));
    source.set_explicit_local_bounds(bigger);
    let proxy_hits = watch(&mut world.instances, proxy.id());
    world.sync(&source);

    assert_eq!(world.instances.get(proxy.id()).unwrap().local_bounds(), bigger);
    assert_eq!(proxy_hits.load(Ordering::Relaxed), 1);
}

#[test]
fn relinking_proxy_unsubscribes_old_source_once() {
    let mut world = World::new();
    let first = world.spawn();
    let second = world.spawn();
    let proxy = world.spawn();
    for source in [&first, &second] {
        source.set_bounds_compute_method(BoundsComputationMode::Explicit);
        source.set_explicit_local_bounds(unit_box());
        world.sync(source);
    }

    proxy.set_bounds_compute_method(BoundsComputationMode::Proxy);
    proxy.set_proxy_bounds_source(Some(first.id()));
    world.sync(&proxy);
    let first_observers = world.instances.get(first.id()).unwrap().observer_count();
    assert_eq!(first_observers, 1);

    proxy.set_proxy_bounds_source(Some(second.id()));
    world.sync(&proxy);

    assert_eq!(world.instances.get(first.id()).unwrap().observer_count(), 0);
    assert_eq!(world.instances.get(second.id()).unwrap().observer_count(), 1);

    // Old source updates no longer reach the proxy
    let proxy_hits = watch(&mut world.instances, proxy.id());
    first.set_explicit_local_bounds(BoundingBox::new(Vec3::splat(-9.0), Vec3::splat(9.0)));
    world.sync(&first);
    assert_eq!(proxy_hits.load(Ordering::Relaxed), 0);
    assert_eq!(world.instances.get(proxy.id()).unwrap().local_bounds(), unit_box());
}

#[test]
fn missing_proxy_target_degrades_to_unlinked() {
    let mut world = World::new();
    let proxy = world.spawn();
    proxy.set_bounds_compute_method(BoundsComputationMode::Proxy);
    proxy.set_proxy_bounds_source(Some(RendererId::next()));

    world.sync(&proxy);

    let instance = world.instances.get(proxy.id()).unwrap();
    assert_eq!(instance.mode(), BoundsComputationMode::Proxy);
    assert!(instance.proxy_link().is_none());
    assert!(!instance.bounding_box_available());
}

#[test]
fn mutual_proxies_do_not_recurse() {
    let mut world = World::new();
    let a = world.spawn();
    let b = world.spawn();
    a.set_bounds_compute_method(BoundsComputationMode::Explicit);
    a.set_explicit_local_bounds(unit_box());
    world.sync(&a);

    b.set_bounds_compute_method(BoundsComputationMode::Proxy);
    b.set_proxy_bounds_source(Some(a.id()));
    world.sync(&b);

    a.set_bounds_compute_method(BoundsComputationMode::Proxy);
    a.set_proxy_bounds_source(Some(b.id()));
    world.sync(&a);

    let a_hits = watch(&mut world.instances, a.id());
    let b_hits = watch(&mut world.instances, b.id());
    world.sync(&b);

    assert_eq!(a_hits.load(Ordering::Relaxed), 1);
    assert_eq!(b_hits.load(Ordering::Relaxed), 1);
}

#[test]
fn detaching_source_drops_proxy_link() {
    let mut world = World::new();
    let source = world.spawn();
    let proxy = world.spawn();
    source.set_bounds_compute_method(BoundsComputationMode::Explicit);
    source.set_explicit_local_bounds(unit_box());
    world.sync(&source);
    proxy.set_bounds_compute_method(BoundsComputationMode::Proxy);
    proxy.set_proxy_bounds_source(Some(source.id()));
    world.sync(&proxy);

    world.instances.detach(source.id()).unwrap();

    let instance = world.instances.get(proxy.id()).unwrap();
    assert_eq!(instance.mode(), BoundsComputationMode::Proxy);
    assert!(instance.proxy_link().is_none());
    assert_eq!(instance.proxy_target(), Some(source.id()));
    assert_eq!(instance.local_bounds(), unit_box());

    // Leaving proxy mode without a source must not fail
    proxy.set_bounds_compute_method(BoundsComputationMode::Static);
    world.sync(&proxy);
    assert!(world.instances.get(proxy.id()).unwrap().proxy_link().is_none());
}

#[test]
fn detaching_proxy_unsubscribes_from_source() {
    let mut world = World::new();
    let source = world.spawn();
    let proxy = world.spawn();
    world.sync(&source);
    proxy.set_bounds_compute_method(BoundsComputationMode::Proxy);
    proxy.set_proxy_bounds_source(Some(source.id()));
    world.sync(&proxy);
    assert_eq!(world.instances.get(source.id()).unwrap().observer_count(), 1);

    world.instances.detach(proxy.id()).unwrap();

    let source_instance = world.instances.get(source.id()).unwrap();
    assert_eq!(source_instance.observer_count(), 0);
    assert!(world.instances.get(proxy.id()).is_none());
    assert_eq!(world.instances.detach(proxy.id()), Err(SkinError::InstanceNotFound(proxy.id())));
}

#[test]
fn proxy_of_reattached_source_is_not_stale() {
    let mut world = World::new();
    let source = world.spawn();
    let proxy = world.spawn();
    source.set_bounds_compute_method(BoundsComputationMode::Explicit);
    source.set_explicit_local_bounds(unit_box());
    world.sync(&source);
    proxy.set_bounds_compute_method(BoundsComputationMode::Proxy);
    proxy.set_proxy_bounds_source(Some(source.id()));
    world.sync(&proxy);

    world.instances.detach(source.id()).unwrap();
    world.instances.attach(source.id(), source.node()).unwrap();
    source.mark_attached();

    let instance = world.instances.get(proxy.id()).unwrap();
    assert_eq!(instance.proxy_link().map(|link| link.source), Some(source.id()));
    assert_eq!(world.instances.get(source.id()).unwrap().observer_count(), 1);

    let moved = BoundingBox::new(Vec3::splat(-5.0), Vec3::splat(5.0));
    source.set_explicit_local_bounds(moved);
    world.sync(&source);
    for _ in 0..3 {
        world.sync(&proxy);
    }

    let instance = world.instances.get(proxy.id()).unwrap();
    assert_eq!(instance.local_bounds(), moved);
    assert!(instance.bounding_box_available());
}

#[test]
fn proxy_links_when_source_attaches_later() {
    let mut world = World::new();
    let proxy = world.spawn();
    let node = world.graph.create_node();
    let source = SkinnedMeshRenderer::new(node);
    proxy.set_bounds_compute_method(BoundsComputationMode::Proxy);
    proxy.set_proxy_bounds_source(Some(source.id()));
    world.sync(&proxy);
    assert!(world.instances.get(proxy.id()).unwrap().proxy_link().is_none());

    world.instances.attach(source.id(), node).unwrap();
    source.set_bounds_compute_method(BoundsComputationMode::Explicit);
    source.set_explicit_local_bounds(unit_box());
    world.sync(&source);

    let instance = world.instances.get(proxy.id()).unwrap();
    assert_eq!(instance.proxy_link().map(|link| link.source), Some(source.id()));
    assert_eq!(instance.local_bounds(), unit_box());
}

// ============================================================================
// Skeleton
// ============================================================================

#[test]
fn bones_truncate_and_preserve_on_resize() {
    let mut world = World::new();
    let renderer = world.spawn();
    let root = renderer.node();
    let bones: Vec<_> = (0..4).map(|i| world.bone(root, Vec3::X * i as f32)).collect();

    renderer.set_mesh(Some(mesh(4, 0)));
    renderer.set_bones(bones.iter().copied().map(Some).collect());
    renderer.set_root_bone(Some(bones[0]));
    world.sync(&renderer);
    assert_eq!(world.instances.get(renderer.id()).unwrap().bones().len(), 4);

    // Shrink: truncates without error
    renderer.set_mesh(Some(mesh(2, 0)));
    world.sync(&renderer);
    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.bones(), &[Some(bones[0]), Some(bones[1])]);

    // Grow with a partial list: old slots keep their bone, new ones stay unresolved
    renderer.set_mesh(Some(mesh(5, 0)));
    renderer.set_bones(vec![None, None]);
    world.sync(&renderer);
    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.bones(), &[Some(bones[0]), Some(bones[1]), None, None, None]);
    assert_eq!(instance.root_bone(), Some(bones[0]));
}

#[test]
fn bone_list_longer_than_mesh_is_clipped() {
    let mut world = World::new();
    let renderer = world.spawn();
    let root = renderer.node();
    let bones: Vec<_> = (0..3).map(|_| world.bone(root, Vec3::ZERO)).collect();

    renderer.set_mesh(Some(mesh(2, 0)));
    renderer.set_bones(bones.iter().copied().map(Some).collect());
    world.sync(&renderer);

    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.bones(), &[Some(bones[0]), Some(bones[1])]);
    assert_eq!(instance.root_bone(), None);
}

#[test]
fn boneless_blend_shape_mesh_gets_synthetic_bone() {
    let mut world = World::new();
    let renderer = world.spawn();
    let stray = world.bone(renderer.node(), Vec3::ZERO);
    renderer.set_mesh(Some(mesh(0, 3)));
    renderer.set_bones(vec![Some(stray), Some(stray)]);
    renderer.set_root_bone(Some(stray));

    world.sync(&renderer);

    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.bones(), &[Some(renderer.node())]);
    assert_eq!(instance.root_bone(), Some(renderer.node()));
}

#[test]
fn boneless_mesh_without_blend_shapes_has_no_bones() {
    let mut world = World::new();
    let renderer = world.spawn();
    renderer.set_mesh(Some(mesh(0, 0)));

    world.sync(&renderer);

    assert!(world.instances.get(renderer.id()).unwrap().bones().is_empty());
}

// ============================================================================
// Blend Shapes
// ============================================================================

#[test]
fn weights_are_zero_filled_past_snapshot() {
    let mut world = World::new();
    let renderer = world.spawn();
    renderer.set_mesh(Some(mesh(0, 4)));
    renderer.set_blend_shape_weights(vec![0.1, 0.2, 0.3, 0.4]);
    world.sync(&renderer);

    renderer.set_blend_shape_weights(vec![0.9]);
    world.sync(&renderer);

    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.blend_shape_weights(), &[0.9, 0.0, 0.0, 0.0]);
}

#[test]
fn weights_beyond_blend_shape_count_are_ignored() {
    let mut world = World::new();
    let renderer = world.spawn();
    renderer.set_mesh(Some(mesh(0, 2)));
    renderer.set_blend_shape_weights(vec![0.5, 0.6, 0.7]);

    world.sync(&renderer);

    assert_eq!(world.instances.get(renderer.id()).unwrap().blend_shape_weights(), &[0.5, 0.6]);
}

#[test]
fn applying_same_snapshot_twice_is_idempotent() {
    let mut world = World::new();
    let renderer = world.spawn();
    renderer.set_mesh(Some(mesh(0, 3)));
    renderer.set_blend_shape_weights(vec![0.25, 0.5]);

    let snapshot = ChangeSnapshot::capture(&renderer, &world.ctx);
    world.instances.apply(renderer.id(), snapshot.clone()).unwrap();
    let first = world.instances.get(renderer.id()).unwrap().blend_shape_weights().to_vec();
    world.instances.apply(renderer.id(), snapshot).unwrap();
    let second = world.instances.get(renderer.id()).unwrap().blend_shape_weights().to_vec();

    assert_eq!(first, vec![0.25, 0.5, 0.0]);
    assert_eq!(first, second);
}

// ============================================================================
// Notification & Flags
// ============================================================================

#[test]
fn apply_notifies_exactly_once() {
    let mut world = World::new();
    let renderer = world.spawn();
    let hits = watch(&mut world.instances, renderer.id());

    renderer.set_mesh(Some(mesh(2, 2)));
    renderer.set_blend_shape_weights(vec![1.0, 1.0]);
    renderer.set_bounds_compute_method(BoundsComputationMode::Explicit);
    renderer.set_explicit_local_bounds(unit_box());
    world.sync(&renderer);

    assert_eq!(hits.load(Ordering::Relaxed), 1);
}

#[test]
fn unsubscribed_observer_is_silent() {
    let mut world = World::new();
    let renderer = world.spawn();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&hits);
    let observer = world
        .instances
        .subscribe(renderer.id(), Box::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();

    assert!(world.instances.unsubscribe(renderer.id(), observer));
    world.sync(&renderer);

    assert_eq!(hits.load(Ordering::Relaxed), 0);
}

#[test]
fn force_recalculation_is_sticky_until_cleared() {
    let mut world = World::new();
    let renderer = world.spawn();
    world.instances.force_recalculation_per_render(renderer.id()).unwrap();

    world.sync(&renderer);
    world.sync(&renderer);
    let instance = world.instances.get(renderer.id()).unwrap();
    assert!(instance.force_recalculation_requested());
    assert!(instance.force_matrix_recalculation_per_render());

    world.instances.clear_force_recalculation_per_render(renderer.id()).unwrap();
    world.sync(&renderer);
    assert!(!world.instances.get(renderer.id()).unwrap().force_matrix_recalculation_per_render());
}

#[test]
fn unknown_instance_is_reported() {
    let mut world = World::new();
    let renderer = SkinnedMeshRenderer::new(world.graph.create_node());
    let snapshot = ChangeSnapshot::capture(&renderer, &world.ctx);

    assert_eq!(
        world.instances.apply(renderer.id(), snapshot),
        Err(SkinError::InstanceNotFound(renderer.id()))
    );
    let node = renderer.node();
    world.instances.attach(renderer.id(), node).unwrap();
    assert_eq!(
        world.instances.attach(renderer.id(), node),
        Err(SkinError::InstanceAlreadyAttached(renderer.id()))
    );
}

// ============================================================================
// End-to-End
// ============================================================================

#[test]
fn boneless_medium_then_explicit() {
    let mut world = World::new();
    let renderer = world.spawn();
    renderer.set_mesh(Some(mesh(0, 3)));
    renderer.set_bounds_compute_method(BoundsComputationMode::MediumPerBoneApproximate);
    world.sync(&renderer);
    assert!(world.instances.get(renderer.id()).unwrap().updater().is_some());

    let hits = watch(&mut world.instances, renderer.id());
    renderer.set_bounds_compute_method(BoundsComputationMode::Explicit);
    renderer.set_explicit_local_bounds(unit_box());
    world.sync(&renderer);

    let instance = world.instances.get(renderer.id()).unwrap();
    assert!(instance.updater().is_none());
    assert_eq!(instance.local_bounds(), unit_box());
    assert!(instance.bounding_box_available());
    assert_eq!(instance.bones(), &[Some(renderer.node())]);
    assert_eq!(hits.load(Ordering::Relaxed), 1);
}

#[test]
fn queue_delivers_lifecycle_in_order() {
    let mut world = World::new();
    let (sender, receiver) = skin_sync_queue();
    let node = world.graph.create_node();
    let renderer = SkinnedMeshRenderer::new(node);
    renderer.set_mesh(Some(mesh(0, 2)));
    renderer.set_blend_shape_weights(vec![0.3, 0.4]);

    let producer = {
        let sender = sender.clone();
        let ctx = world.ctx;
        std::thread::spawn(move || {
            sender.attach(&renderer).unwrap();
            sender.submit(&renderer, &ctx).unwrap();
            renderer
        })
    };
    let renderer = producer.join().unwrap();
    assert_eq!(receiver.pending(), 2);

    assert_eq!(world.instances.drain(&receiver), 2);
    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.blend_shape_weights(), &[0.3, 0.4]);

    sender.detach(renderer.id()).unwrap();
    sender.detach(renderer.id()).unwrap();
    // The second detach addresses a gone instance and is skipped
    assert_eq!(world.instances.drain(&receiver), 1);
    assert!(world.instances.is_empty());
}

#[test]
fn reattach_restores_skeleton_and_weights() {
    let mut world = World::new();
    let (sender, receiver) = skin_sync_queue();
    let node = world.graph.create_node();
    let bones = [world.bone(node, Vec3::X), world.bone(node, Vec3::Y)];
    let renderer = SkinnedMeshRenderer::new(node);
    renderer.set_mesh(Some(mesh(2, 2)));
    renderer.set_bones(bones.iter().copied().map(Some).collect());
    renderer.set_blend_shape_weights(vec![0.3, 0.4]);

    sender.attach(&renderer).unwrap();
    sender.submit(&renderer, &world.ctx).unwrap();
    assert_eq!(world.instances.drain(&receiver), 2);

    sender.detach(renderer.id()).unwrap();
    sender.attach(&renderer).unwrap();
    sender.submit(&renderer, &world.ctx).unwrap();
    assert_eq!(world.instances.drain(&receiver), 3);

    let instance = world.instances.get(renderer.id()).unwrap();
    assert_eq!(instance.bones(), &[Some(bones[0]), Some(bones[1])]);
    assert_eq!(instance.blend_shape_weights(), &[0.3, 0.4]);
}

#[test]
fn mark_attached_redirties_full_state() {
    let mut world = World::new();
    let renderer = world.spawn();
    world.sync(&renderer);
    assert!(renderer.pending_changes().is_empty());

    renderer.mark_attached();

    let snapshot = ChangeSnapshot::capture(&renderer, &world.ctx);
    assert!(snapshot.mesh_changed());
    assert!(snapshot.skeleton().is_some());
    assert!(snapshot.blend_shape_weights().is_some());
}
