//! Draft plans written by hand as TOML
//!
//! ```toml
//! name = "Cart v2"
//!
//! [[component]]
//! name = "Left wheel"
//! mesh = "Wheel-L"
//! ```
//!
//! Components are numbered in file order.

use std::path::Path;

use assembly_core::{
    ComponentRegistry, DraftPlan, ProductId, StepSequencer, ValidationError,
};
use assembly_scene::SceneModel;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DraftFileError {
    #[error("Failed to read draft: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid draft: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Component {index}: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("Mesh '{0}' is not in the model")]
    UnknownMesh(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "component")]
    pub components: Vec<DraftEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftEntry {
    pub name: String,
    pub mesh: String,
}

impl DraftFile {
    pub fn load(path: &Path) -> Result<Self, DraftFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, DraftFileError> {
        Ok(toml::from_str(content)?)
    }

    /// Every mesh must exist in `model`
    pub fn check_meshes(&self, model: &SceneModel) -> Result<(), DraftFileError> {
        match self.components.iter().find(|c| model.find(&c.mesh).is_none()) {
            Some(missing) => Err(DraftFileError::UnknownMesh(missing.mesh.clone())),
            None => Ok(()),
        }
    }

    /// Run the entries through the same registry rules the editor uses
    pub fn to_draft(&self, product_id: ProductId) -> Result<DraftPlan, DraftFileError> {
        let mut registry = ComponentRegistry::new();
        let mut sequencer = StepSequencer::new();
        for (index, entry) in self.components.iter().enumerate() {
            let temp_id = registry
                .add_component(&entry.name, &entry.mesh)
                .map_err(|source| DraftFileError::Invalid {
                    index: index + 1,
                    source,
                })?
                .temp_id;
            sequencer.push(temp_id);
        }
        Ok(DraftPlan::snapshot(
            product_id,
            self.name.as_deref(),
            &registry,
            &sequencer,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assembly_scene::glam::Vec3;
    use assembly_scene::MeshNode;

    const CART: &str = r#"
name = "Cart v2"

[[component]]
name = "Left wheel"
mesh = "Wheel-L"

[[component]]
name = "Right wheel"
mesh = "Wheel-R"
"#;

    #[test]
    fn test_file_order_is_step_order() {
        let draft = DraftFile::parse(CART).unwrap().to_draft(7).unwrap();
        assert_eq!(draft.name, "Cart v2");
        assert_eq!(draft.product_id, 7);
        let meshes: Vec<_> = draft
            .order
            .iter()
            .filter_map(|id| draft.components.iter().find(|c| c.temp_id == *id))
            .map(|c| c.mesh_id.as_str())
            .collect();
        assert_eq!(meshes, vec!["Wheel-L", "Wheel-R"]);
    }

    #[test]
    fn test_missing_name_uses_default() {
        let draft = DraftFile::parse("[[component]]\nname = \"Bolt\"\nmesh = \"M8\"\n")
            .unwrap()
            .to_draft(3)
            .unwrap();
        assert_eq!(draft.name, "Assembly Plan for Product #3");
    }

    #[test]
    fn test_duplicate_mesh_is_rejected() {
        let file = DraftFile::parse(
            r#"
[[component]]
name = "Left wheel"
mesh = "Wheel-L"

[[component]]
name = "Spare"
mesh = "Wheel-L"
"#,
        )
        .unwrap();
        match file.to_draft(1) {
            Err(DraftFileError::Invalid { index, source }) => {
                assert_eq!(index, 2);
                assert_eq!(source, ValidationError::DuplicateMesh("Wheel-L".to_string()));
            }
            other => panic!("expected a duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_mesh_is_reported() {
        let model = SceneModel::new(vec![MeshNode::cuboid(
            "Wheel-L",
            Vec3::ZERO,
            Vec3::splat(0.5),
        )]);
        let file = DraftFile::parse(CART).unwrap();
        match file.check_meshes(&model) {
            Err(DraftFileError::UnknownMesh(mesh)) => assert_eq!(mesh, "Wheel-R"),
            other => panic!("expected an unknown mesh, got {:?}", other),
        }
    }
}
