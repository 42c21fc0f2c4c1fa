//! Approximate skinned bounds
//!
//! Pure functions estimating a skinned mesh's local box from static per-bone
//! tables and the current bone transforms. Results are in the space of the
//! node the renderer lives on. Missing bones or nodes are skipped; when
//! nothing contributes the result is `None`.

use glam::Affine3A;

use crate::resources::{ApproximateBoneBounds, BoneMetadata, BoundingBox};
use crate::scene::{NodeHandle, TransformSource};

/// Pose inputs of one skinned instance.
#[derive(Debug, Clone, Copy)]
pub struct SkinRig<'a> {
    /// Node whose space the result is expressed in.
    pub node: NodeHandle,
    pub bones: &'a [Option<NodeHandle>],
}

impl SkinRig<'_> {
    /// Matrix from bone `index`'s space to the rig node's space.
    fn bone_to_local(
        &self,
        index: usize,
        local_inv: &Affine3A,
        transforms: &dyn TransformSource,
    ) -> Option<Affine3A> {
        let bone = self.bones.get(index).copied().flatten()?;
        let bone_world = transforms.world_matrix(bone)?;
        Some(*local_inv * bone_world)
    }

    fn local_inverse(&self, transforms: &dyn TransformSource) -> Option<Affine3A> {
        transforms.world_matrix(self.node).map(|m| m.inverse())
    }
}

fn max_scale(matrix: &Affine3A) -> f32 {
    matrix
        .matrix3
        .x_axis
        .length()
        .max(matrix.matrix3.y_axis.length())
        .max(matrix.matrix3.z_axis.length())
}

/// One sphere per disjoint bone subtree, anchored at the subtree root.
pub fn fast_disjoint_root(
    roots: &[ApproximateBoneBounds],
    rig: &SkinRig<'_>,
    transforms: &dyn TransformSource,
) -> Option<BoundingBox> {
    let local_inv = rig.local_inverse(transforms)?;

    roots
        .iter()
        .filter_map(|root| {
            let to_local = rig.bone_to_local(root.root_bone_index, &local_inv, transforms)?;
            let center = to_local.transform_point3(root.center);
            Some(BoundingBox::from_sphere(center, root.radius * max_scale(&to_local)))
        })
        .reduce(|a, b| a.union(&b))
}

/// Union of every weighted bone's bind-space box carried to the rig node.
pub fn per_bone(
    metadata: &[BoneMetadata],
    rig: &SkinRig<'_>,
    transforms: &dyn TransformSource,
) -> Option<BoundingBox> {
    let local_inv = rig.local_inverse(transforms)?;

    metadata
        .iter()
        .enumerate()
        .filter(|(_, meta)| meta.is_weighted())
        .filter_map(|(index, meta)| {
            let to_local = rig.bone_to_local(index, &local_inv, transforms)?;
            Some(meta.bounds.transform(&to_local))
        })
        .reduce(|a, b| a.union(&b))
}
