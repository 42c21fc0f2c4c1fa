#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use errors::{Result, SkinError};
pub use renderer::SkinSettings;
pub use renderer::skinning::{
    BoundsComputationMode, CaptureContext, ChangeSnapshot, SkinBoundsUpdater, SkinnedInstances,
    SkinnedMeshInstance, skin_sync_queue,
};
pub use resources::{ApproximateBoneBounds, BoneMetadata, BoundingBox, MeshAsset};
pub use scene::{NodeHandle, RendererId, SceneGraph, SkinnedMeshRenderer, UserId};
