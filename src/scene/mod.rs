//! Scene Graph
//!
//! A pure data layer: nodes form the hierarchy, components (meshes, lights,
//! cameras) and shared resources (poly lists, materials) live in slotmap
//! pools referenced by key. World matrices are updated iteratively before
//! each frame.

pub mod camera;
pub mod environment;
pub mod light;
pub mod node;
pub mod transform;
pub mod visitor;

pub use camera::{Camera, ProjectionType};
pub use environment::{EnvSource, Environment};
pub use light::{Light, LightType};
pub use node::Node;
pub use transform::Transform;
pub use visitor::{traverse, MatrixStack, SceneVisitor};

use glam::Vec4;
use slotmap::{new_key_type, SlotMap};

use crate::resources::geometry::PolyList;
use crate::resources::material::Material;

new_key_type! {
    pub struct NodeKey;
    pub struct MeshKey;
    pub struct LightKey;
    pub struct CameraKey;
    pub struct GeometryKey;
    pub struct MaterialKey;
}

/// A drawable component: geometry + material pair.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub geometry: GeometryKey,
    pub material: MaterialKey,
    /// Whether the picking pass assigns this mesh an id.
    pub selectable: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(name: &str, geometry: GeometryKey, material: MaterialKey) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            material,
            selectable: true,
        }
    }
}

/// Scene graph plus component and resource pools.
pub struct Scene {
    pub nodes: SlotMap<NodeKey, Node>,
    pub root_nodes: Vec<NodeKey>,

    pub geometries: SlotMap<GeometryKey, PolyList>,
    pub materials: SlotMap<MaterialKey, Material>,
    pub meshes: SlotMap<MeshKey, Mesh>,
    pub lights: SlotMap<LightKey, Light>,
    pub cameras: SlotMap<CameraKey, Camera>,

    pub environment: Environment,
    pub background: Option<Vec4>,
    pub active_camera: Option<NodeKey>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            geometries: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            lights: SlotMap::with_key(),
            cameras: SlotMap::with_key(),
            environment: Environment::new(),
            background: Some(Vec4::new(0.0, 0.0, 0.0, 1.0)),
            active_camera: None,
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Inserts a node as a root.
    pub fn add_node(&mut self, node: Node) -> NodeKey {
        let key = self.nodes.insert(node);
        self.root_nodes.push(key);
        key
    }

    pub fn add_to_parent(&mut self, child: Node, parent: NodeKey) -> NodeKey {
        let key = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        if let Some(c) = self.nodes.get_mut(key) {
            c.parent = Some(parent);
        }
        key
    }

    /// Re-parents `child` under `parent`, keeping both sides in sync.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) {
        if child == parent {
            log::warn!("cannot attach node to itself");
            return;
        }

        // Detach from old parent or root list.
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child) {
            self.root_nodes.remove(i);
        }

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        } else {
            log::error!("parent node not found during attach");
            self.root_nodes.push(child);
            return;
        }

        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    /// Removes a node and its whole subtree, dropping attached components.
    pub fn remove_node(&mut self, key: NodeKey) {
        let children = match self.nodes.get(key) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for child in children {
            self.remove_node(child);
        }

        let parent = self.nodes.get(key).and_then(|n| n.parent);
        if let Some(p) = parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == key)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == key) {
            self.root_nodes.remove(i);
        }

        if let Some(node) = self.nodes.get(key) {
            if let Some(mesh) = node.mesh {
                self.meshes.remove(mesh);
            }
            if let Some(light) = node.light {
                self.lights.remove(light);
            }
            if let Some(camera) = node.camera {
                self.cameras.remove(camera);
            }
        }
        self.nodes.remove(key);
    }

    #[must_use]
    pub fn get_node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn get_node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    // ========================================================================
    // Component builders
    // ========================================================================

    pub fn add_geometry(&mut self, geometry: PolyList) -> GeometryKey {
        self.geometries.insert(geometry)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    /// Creates a node carrying a mesh component.
    pub fn add_mesh(&mut self, mesh: Mesh) -> NodeKey {
        let mut node = Node::new(&mesh.name);
        node.mesh = Some(self.meshes.insert(mesh));
        self.add_node(node)
    }

    pub fn add_light(&mut self, light: Light) -> NodeKey {
        let mut node = Node::new("Light");
        node.light = Some(self.lights.insert(light));
        self.add_node(node)
    }

    /// Creates a camera node and makes it active when none is.
    pub fn add_camera(&mut self, camera: Camera) -> NodeKey {
        let mut node = Node::new("Camera");
        node.camera = Some(self.cameras.insert(camera));
        let key = self.add_node(node);
        if self.active_camera.is_none() {
            self.active_camera = Some(key);
        }
        key
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Active camera's node key together with its camera key.
    #[must_use]
    pub fn main_camera(&self) -> Option<(NodeKey, CameraKey)> {
        let node_key = self.active_camera?;
        let camera_key = self.nodes.get(node_key)?.camera?;
        Some((node_key, camera_key))
    }

    /// First enabled shadow-casting light and its node.
    #[must_use]
    pub fn shadow_caster(&self) -> Option<(NodeKey, LightKey)> {
        self.nodes.iter().find_map(|(node_key, node)| {
            let light_key = node.light?;
            let light = self.lights.get(light_key)?;
            (light.enabled() && light.cast_shadows).then_some((node_key, light_key))
        })
    }

    // ========================================================================
    // World-matrix update
    // ========================================================================

    /// Updates local and world matrices of the whole graph, iteratively to
    /// keep deep hierarchies off the call stack.
    pub fn update_matrix_world(&mut self) {
        let mut pending: Vec<(NodeKey, glam::Affine3A)> = self
            .root_nodes
            .iter()
            .map(|&k| (k, glam::Affine3A::IDENTITY))
            .collect();

        while let Some((key, parent_world)) = pending.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            node.transform.update_local_matrix();
            node.transform.world_matrix = parent_world * node.transform.local_matrix;
            let world = node.transform.world_matrix;
            for &child in &node.children {
                pending.push((child, world));
            }
        }
    }
}
