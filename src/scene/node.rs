use glam::Affine3A;

use crate::scene::NodeHandle;
use crate::scene::transform::Transform;

/// A minimal scene node: hierarchy links plus a transform.
///
/// Skinned renderers bind their bones and root bone to nodes, and use their
/// own node as the space approximate bounds are expressed in.
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node handle (None for root nodes)
    pub(crate) parent: Option<NodeHandle>,
    /// Child node handles
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,
}

impl Node {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// World matrix as of the last [`SceneGraph::update_world_matrices`](crate::scene::SceneGraph::update_world_matrices).
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
