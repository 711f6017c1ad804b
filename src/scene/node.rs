//! Scene Node
//!
//! A minimal node: hierarchy, transform, visibility, and at most one
//! component of each closed kind (mesh, light, camera) referenced by slotmap
//! key. Component dispatch is by this closed set, never by name.

use crate::scene::transform::Transform;
use crate::scene::{CameraKey, LightKey, MeshKey, NodeKey};

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,

    pub name: String,
    pub transform: Transform,
    /// Invisible nodes are pruned with their whole subtree during traversal.
    pub visible: bool,

    pub mesh: Option<MeshKey>,
    pub light: Option<LightKey>,
    pub camera: Option<CameraKey>,
}

impl Node {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            name: name.to_string(),
            transform: Transform::new(),
            visible: true,
            mesh: None,
            light: None,
            camera: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("Node")
    }
}
