//! Scene Traversal
//!
//! Visitor walking the scene graph with an explicit model-matrix stack.
//! Components dispatch through the closed visitor interface (drawable /
//! light / camera), never by name. Invisible nodes prune their subtree.
//!
//! An unbalanced pop is a fatal underflow: the stack panics instead of
//! recovering, since it indicates a traversal bug, not bad scene data.

use glam::Affine3A;

use crate::scene::{CameraKey, LightKey, MeshKey, NodeKey, Scene};

/// Explicit model-matrix stack used during traversal.
#[derive(Debug)]
pub struct MatrixStack {
    stack: Vec<Affine3A>,
    current: Affine3A,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(16),
            current: Affine3A::IDENTITY,
        }
    }

    /// Pushes the current matrix and multiplies `local` onto it.
    pub fn push(&mut self, local: &Affine3A) {
        self.stack.push(self.current);
        self.current = self.current * *local;
    }

    /// Restores the matrix saved by the matching `push`.
    ///
    /// # Panics
    ///
    /// Panics on underflow; popping more than was pushed is a traversal bug.
    pub fn pop(&mut self) {
        self.current = self.stack.pop().expect("matrix stack underflow");
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> &Affine3A {
        &self.current
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Closed component dispatch for scene traversal.
#[allow(unused_variables)]
pub trait SceneVisitor {
    fn visit_mesh(&mut self, scene: &Scene, node: NodeKey, mesh: MeshKey, world: &Affine3A) {}
    fn visit_light(&mut self, scene: &Scene, node: NodeKey, light: LightKey, world: &Affine3A) {}
    fn visit_camera(&mut self, scene: &Scene, node: NodeKey, camera: CameraKey, world: &Affine3A) {}
}

/// Walks the whole scene depth-first, maintaining the matrix stack and
/// dispatching each node's components.
pub fn traverse(scene: &Scene, visitor: &mut dyn SceneVisitor) {
    let mut stack = MatrixStack::new();
    for &root in &scene.root_nodes {
        visit_node(scene, root, &mut stack, visitor);
    }
    debug_assert_eq!(stack.depth(), 0, "traversal left the matrix stack unbalanced");
}

fn visit_node(scene: &Scene, key: NodeKey, stack: &mut MatrixStack, visitor: &mut dyn SceneVisitor) {
    let Some(node) = scene.nodes.get(key) else {
        return;
    };
    if !node.visible {
        return;
    }

    stack.push(node.transform.local_matrix());
    let world = *stack.current();

    if let Some(mesh) = node.mesh {
        visitor.visit_mesh(scene, key, mesh, &world);
    }
    if let Some(light) = node.light {
        visitor.visit_light(scene, key, light, &world);
    }
    if let Some(camera) = node.camera {
        visitor.visit_camera(scene, key, camera, &world);
    }

    for &child in &node.children {
        visit_node(scene, child, stack, visitor);
    }

    stack.pop();
}
