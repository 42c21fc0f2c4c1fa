//! Scene-side (producer) data
//!
//! - Node / Transform / SceneGraph: the transform hierarchy bones bind to
//! - SkinnedMeshRenderer: the mutable skinned-mesh descriptor edited by gameplay code

pub mod graph;
pub mod node;
pub mod skinned_mesh;
pub mod transform;

pub use graph::{SceneGraph, TransformSource};
pub use node::Node;
pub use skinned_mesh::{RendererId, SkinnedMeshRenderer, SkinnedMeshState, UserId};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
}
