//! Scene state: loaded model, camera, viewport, and per-mesh material slots

use glam::{Mat4, Vec2, Vec3};
use tracing::{debug, info};

use crate::camera::OrbitCamera;
use crate::geometry::{Aabb, Ray};
use crate::materials::MaterialId;

/// Index of a mesh node inside the current [`SceneModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One named mesh with its geometry baked into world space
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub name: String,
    /// Node-to-world transform
    pub world: Mat4,
    /// Vertex positions in world space
    pub positions: Vec<Vec3>,
    /// Triangle list indices into `positions`
    pub indices: Vec<u32>,
    pub bounds: Aabb,
    pub material: MaterialId,
}

impl MeshNode {
    /// Build a node from local-space geometry, baking in `world`
    pub fn new(name: impl Into<String>, world: Mat4, local: &[Vec3], indices: Vec<u32>) -> Self {
        let positions: Vec<Vec3> = local.iter().map(|p| world.transform_point3(*p)).collect();
        let origin = world.transform_point3(Vec3::ZERO);
        let bounds = Aabb::from_points(&positions).unwrap_or(Aabb::new(origin, origin));
        Self {
            name: name.into(),
            world,
            positions,
            indices,
            bounds,
            material: MaterialId::Default,
        }
    }

    /// Axis-aligned box centered at `center`
    pub fn cuboid(name: impl Into<String>, center: Vec3, half_extents: Vec3) -> Self {
        let (x, y, z) = (half_extents.x, half_extents.y, half_extents.z);
        let local = [
            Vec3::new(-x, -y, -z),
            Vec3::new(x, -y, -z),
            Vec3::new(x, y, -z),
            Vec3::new(-x, y, -z),
            Vec3::new(-x, -y, z),
            Vec3::new(x, -y, z),
            Vec3::new(x, y, z),
            Vec3::new(-x, y, z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            4, 5, 6, 4, 6, 7, // +z
            1, 0, 3, 1, 3, 2, // -z
            5, 1, 2, 5, 2, 6, // +x
            0, 4, 7, 0, 7, 3, // -x
            7, 6, 2, 7, 2, 3, // +y
            0, 1, 5, 0, 5, 4, // -y
        ];
        Self::new(name, Mat4::from_translation(center), &local, indices)
    }

    /// World position of the node's origin
    pub fn origin(&self) -> Vec3 {
        self.world.transform_point3(Vec3::ZERO)
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }
}

/// A loaded model: a flat list of mesh nodes
#[derive(Debug, Clone, Default)]
pub struct SceneModel {
    nodes: Vec<MeshNode>,
}

impl SceneModel {
    pub fn new(nodes: Vec<MeshNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[MeshNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&MeshNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut MeshNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// First node with this name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Box around every node, `None` for an empty model
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes
            .iter()
            .map(|n| n.bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Pixel coordinates to normalized device coordinates
    pub fn to_ndc(&self, x: f32, y: f32) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            (x / self.width) * 2.0 - 1.0,
            -(y / self.height) * 2.0 + 1.0,
        ))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Owns the model, the camera, and the viewport
#[derive(Debug, Clone)]
pub struct SceneManager {
    pub camera: OrbitCamera,
    model: Option<SceneModel>,
    viewport: Viewport,
}

impl SceneManager {
    pub fn new(viewport: Viewport) -> Self {
        let mut camera = OrbitCamera::default();
        camera.aspect = viewport.aspect();
        Self {
            camera,
            model: None,
            viewport,
        }
    }

    /// Swap in a new model and frame the camera on it
    pub fn replace_model(&mut self, mut model: SceneModel) {
        for node in &mut model.nodes {
            node.material = MaterialId::Default;
        }
        if let Some(bounds) = model.bounds() {
            self.camera.frame_bounds(&bounds);
        }
        info!(meshes = model.len(), "Model loaded into scene");
        self.model = Some(model);
    }

    pub fn clear_model(&mut self) {
        self.model = None;
    }

    pub fn model(&self) -> Option<&SceneModel> {
        self.model.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&MeshNode> {
        self.model.as_ref()?.node(id)
    }

    pub fn find_mesh(&self, mesh_id: &str) -> Option<NodeId> {
        self.model.as_ref()?.find(mesh_id)
    }

    pub fn mesh_names(&self) -> Vec<&str> {
        self.model
            .iter()
            .flat_map(|m| m.nodes.iter().map(|n| n.name.as_str()))
            .collect()
    }

    pub fn material(&self, id: NodeId) -> Option<MaterialId> {
        self.node(id).map(|n| n.material)
    }

    /// Point a mesh at a library material; false if the node does not exist
    pub fn set_material(&mut self, id: NodeId, material: MaterialId) -> bool {
        match self.model.as_mut().and_then(|m| m.node_mut(id)) {
            Some(node) => {
                node.material = material;
                true
            }
            None => false,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        self.camera.aspect = self.viewport.aspect();
        debug!(width, height, "Viewport resized");
    }

    /// World-space ray through a pixel, `None` for an empty viewport
    pub fn ray_from_screen(&self, x: f32, y: f32) -> Option<Ray> {
        let ndc = self.viewport.to_ndc(x, y)?;
        Some(self.camera.ray_from_ndc(ndc))
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}
