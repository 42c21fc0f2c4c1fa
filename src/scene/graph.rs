//! Scene graph (collaborator)
//!
//! Owns nodes in a `SlotMap` and propagates world matrices down the hierarchy.
//! The skinning layer only reads from it through [`TransformSource`], so any
//! other hierarchy implementation can stand in.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::node::Node;

/// Read access to resolved node transforms.
pub trait TransformSource {
    /// World matrix of `node`, or `None` if the node no longer exists.
    fn world_matrix(&self, node: NodeHandle) -> Option<Affine3A>;

    fn contains(&self, node: NodeHandle) -> bool {
        self.world_matrix(node).is_some()
    }
}

impl TransformSource for SlotMap<NodeHandle, Node> {
    fn world_matrix(&self, node: NodeHandle) -> Option<Affine3A> {
        self.get(node).map(|n| n.transform.world_matrix)
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node at the root level.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn create_node(&mut self) -> NodeHandle {
        self.add_node(Node::new())
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Re-parents `child` under `parent`. Attaching a node to itself is a no-op.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent || !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            return;
        }

        self.detach_from_parent(child);

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    /// Removes a node and its whole subtree.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };

        for child in node.children.clone() {
            self.remove_node(child);
        }

        self.detach_from_parent(handle);
        self.root_nodes.retain(|&h| h != handle);
        self.nodes.remove(handle);
    }

    fn detach_from_parent(&mut self, handle: NodeHandle) {
        let parent = self.nodes.get(handle).and_then(|n| n.parent);

        match parent {
            Some(parent_handle) => {
                if let Some(parent) = self.nodes.get_mut(parent_handle) {
                    parent.children.retain(|&c| c != handle);
                }
                if let Some(node) = self.nodes.get_mut(handle) {
                    node.parent = None;
                }
            }
            None => self.root_nodes.retain(|&h| h != handle),
        }
    }

    /// Propagates world matrices from the roots, touching only changed subtrees.
    pub fn update_world_matrices(&mut self) {
        // (node, parent world matrix, parent changed)
        let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

        for &root in self.root_nodes.iter().rev() {
            stack.push((root, Affine3A::IDENTITY, false));
        }

        while let Some((handle, parent_world, parent_changed)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };

            let local_changed = node.transform.update_local_matrix();
            let world_needs_update = local_changed || parent_changed;

            if world_needs_update {
                let new_world = parent_world * *node.transform.local_matrix();
                node.transform.set_world_matrix(new_world);
            }

            let current_world = node.transform.world_matrix;
            for &child in node.children.iter().rev() {
                stack.push((child, current_world, world_needs_update));
            }
        }
    }
}

impl TransformSource for SceneGraph {
    fn world_matrix(&self, node: NodeHandle) -> Option<Affine3A> {
        self.nodes.world_matrix(node)
    }
}
