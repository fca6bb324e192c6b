//! Draft component registry
//!
//! Holds the components an admin has confirmed during one editing session.
//! Temporary ids come from a monotonic counter so two selections can never
//! collide, no matter how quickly they happen.

use tracing::debug;

use crate::error::ValidationError;
use crate::model::{DraftComponent, TempId};

/// In-memory draft list of named components keyed by mesh
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: Vec<DraftComponent>,
    next_id: u64,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component for the given mesh
    ///
    /// Rejects names that are empty after trimming and meshes that already
    /// back another component.
    pub fn add_component(
        &mut self,
        name: &str,
        mesh_id: &str,
    ) -> Result<&DraftComponent, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.contains_mesh(mesh_id) {
            return Err(ValidationError::DuplicateMesh(mesh_id.to_string()));
        }

        let temp_id = self.fresh_id();
        debug!(%temp_id, name, mesh = mesh_id, "Drafted component");
        self.components.push(DraftComponent {
            temp_id,
            name: name.to_string(),
            mesh_id: mesh_id.to_string(),
        });
        Ok(&self.components[self.components.len() - 1])
    }

    /// Add a component for the current selection, if there is one
    pub fn add_selected(
        &mut self,
        name: &str,
        selected_mesh: Option<&str>,
    ) -> Result<&DraftComponent, ValidationError> {
        let mesh_id = selected_mesh.ok_or(ValidationError::NoSelection)?;
        self.add_component(name, mesh_id)
    }

    /// Remove a drafted component, returning it if it existed
    pub fn remove(&mut self, temp_id: TempId) -> Option<DraftComponent> {
        let index = self.components.iter().position(|c| c.temp_id == temp_id)?;
        Some(self.components.remove(index))
    }

    pub fn get(&self, temp_id: TempId) -> Option<&DraftComponent> {
        self.components.iter().find(|c| c.temp_id == temp_id)
    }

    pub fn contains_mesh(&self, mesh_id: &str) -> bool {
        self.components.iter().any(|c| c.mesh_id == mesh_id)
    }

    /// Components in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = &DraftComponent> {
        self.components.iter()
    }

    pub fn components(&self) -> &[DraftComponent] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Discard all drafted components; ids keep counting up
    pub fn clear(&mut self) {
        self.components.clear();
    }

    fn fresh_id(&mut self) -> TempId {
        self.next_id += 1;
        TempId::new(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assigns_unique_increasing_ids() {
        let mut registry = ComponentRegistry::new();
        let a = registry.add_component("Left wheel", "Wheel-L").unwrap().temp_id;
        let b = registry.add_component("Right wheel", "Wheel-R").unwrap().temp_id;
        assert!(b > a);

        registry.remove(b);
        let c = registry.add_component("Right wheel", "Wheel-R").unwrap().temp_id;
        assert!(c > b);
    }

    #[test]
    fn test_name_is_trimmed_and_required() {
        let mut registry = ComponentRegistry::new();
        assert_eq!(
            registry.add_component("   ", "Wheel-L").unwrap_err(),
            ValidationError::EmptyName
        );
        assert!(registry.is_empty());

        let added = registry.add_component("  Axle \n", "Axle").unwrap();
        assert_eq!(added.name, "Axle");
    }

    #[test]
    fn test_duplicate_mesh_rejected_for_any_prior_contents() {
        let meshes = ["A", "B", "C", "D"];
        for prefix_len in 1..=meshes.len() {
            let mut registry = ComponentRegistry::new();
            for mesh in &meshes[..prefix_len] {
                registry.add_component(&format!("part {mesh}"), mesh).unwrap();
            }
            for mesh in &meshes[..prefix_len] {
                assert_eq!(
                    registry.add_component("again", mesh).unwrap_err(),
                    ValidationError::DuplicateMesh(mesh.to_string())
                );
            }
            assert_eq!(registry.len(), prefix_len);
        }
    }

    #[test]
    fn test_add_selected_requires_selection() {
        let mut registry = ComponentRegistry::new();
        assert_eq!(
            registry.add_selected("Bolt", None).unwrap_err(),
            ValidationError::NoSelection
        );
        assert!(registry.add_selected("Bolt", Some("Bolt-01")).is_ok());
        assert!(registry.contains_mesh("Bolt-01"));
    }
}
