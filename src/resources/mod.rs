//! Core resource definitions
//!
//! Plain data shared by the scene side and the render side:
//! - BoundingBox: local-space axis-aligned box
//! - MeshAsset: bone / blend-shape counts and static per-bone tables
//! - ChangeFlags: atomic dirty-flag cell for producer-side edits

pub mod bounding_box;
pub mod change_flags;
pub mod mesh_asset;

pub use bounding_box::BoundingBox;
pub use change_flags::{ChangeFlags, SkinChanges};
pub use mesh_asset::{ApproximateBoneBounds, BoneMetadata, MeshAsset};
