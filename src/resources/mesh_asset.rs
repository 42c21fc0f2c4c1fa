//! Skinned mesh asset data consumed by the synchronization layer.
//!
//! Only the parts of a mesh that influence skeleton binding and bounds
//! are modelled here: bone / blend-shape counts and the two static tables
//! used by the bounds approximator. Vertex data and GPU upload live elsewhere.

use glam::Vec3;
use uuid::Uuid;

use crate::resources::BoundingBox;

/// Static influence volume of a single bone.
///
/// `bounds` is expressed in the bone's bind space: the box enclosing every
/// vertex that carries a non-zero weight for this bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneMetadata {
    pub bounds: BoundingBox,
    /// Number of vertices weighted to this bone. Bones without any
    /// weighted vertex do not contribute to approximate bounds.
    pub weighted_vertices: u32,
}

impl BoneMetadata {
    #[inline]
    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.weighted_vertices > 0
    }
}

/// Coarse bounding sphere of one disjoint bone subtree, anchored at its root bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateBoneBounds {
    /// Index into the mesh bone list.
    pub root_bone_index: usize,
    /// Sphere center in the root bone's space.
    pub center: Vec3,
    pub radius: f32,
}

/// Read-only skinning description of a mesh.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub id: Uuid,
    pub name: String,
    pub bone_count: usize,
    pub blend_shape_count: usize,
    pub bone_metadata: Vec<BoneMetadata>,
    pub approximate_bone_bounds: Vec<ApproximateBoneBounds>,
}

impl MeshAsset {
    #[must_use]
    pub fn new(name: &str, bone_count: usize, blend_shape_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            bone_count,
            blend_shape_count,
            bone_metadata: Vec::new(),
            approximate_bone_bounds: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_bone_metadata(mut self, metadata: Vec<BoneMetadata>) -> Self {
        self.bone_metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_approximate_bounds(mut self, bounds: Vec<ApproximateBoneBounds>) -> Self {
        self.approximate_bone_bounds = bounds;
        self
    }
}
