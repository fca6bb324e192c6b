//! glTF/GLB model loading
//!
//! Every mesh-bearing node becomes one [`MeshNode`] with its world transform
//! baked in. Source materials are ignored; all meshes start on the default
//! library material.

use glam::{Mat4, Vec3};
use gltf::mesh::Mode;
use thiserror::Error;
use tracing::{debug, info};

use crate::scene::{MeshNode, SceneModel};

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Failed to fetch model: {0}")]
    Fetch(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("Model has no scene")]
    NoScene,
    #[error("Model contains no meshes")]
    NoMeshes,
}

/// Parse a GLB (or self-contained glTF) into a scene model
pub fn load_glb(bytes: &[u8]) -> Result<SceneModel, ModelLoadError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(ModelLoadError::NoScene)?;

    let mut nodes = Vec::new();
    for node in scene.nodes() {
        collect_meshes(&node, Mat4::IDENTITY, &buffers, &mut nodes);
    }
    if nodes.is_empty() {
        return Err(ModelLoadError::NoMeshes);
    }

    for node in &nodes {
        debug!(mesh = %node.name, triangles = node.indices.len() / 3, "Found mesh");
    }
    info!(meshes = nodes.len(), "Loaded glTF model");
    Ok(SceneModel::new(nodes))
}

/// Read a model file from disk
pub fn load_glb_file(path: &std::path::Path) -> Result<SceneModel, ModelLoadError> {
    let bytes = std::fs::read(path)?;
    load_glb(&bytes)
}

fn collect_meshes(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshNode>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = node
            .name()
            .or_else(|| mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node.index()));

        let mut local: Vec<Vec3> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                debug!(mesh = %name, mode = ?primitive.mode(), "Skipping non-triangle primitive");
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };

            let base = local.len() as u32;
            local.extend(positions.map(Vec3::from));
            let count = local.len() as u32 - base;
            match reader.read_indices() {
                Some(read) => indices.extend(read.into_u32().map(|i| base + i)),
                None => indices.extend(base..base + count),
            }
        }
        out.push(MeshNode::new(name, world, &local, indices));
    }

    for child in node.children() {
        collect_meshes(&child, world, buffers, out);
    }
}
