//! Step ordering over drafted components
//!
//! Only the order is stored. Step numbers are derived from position whenever
//! they are needed, so reordering can never leave gaps or duplicates.

use crate::model::{DraftComponent, TempId};
use crate::registry::ComponentRegistry;

#[derive(Debug, Default, Clone)]
pub struct StepSequencer {
    order: Vec<TempId>,
}

impl StepSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component as the last step; ignored if already sequenced
    pub fn push(&mut self, temp_id: TempId) {
        if !self.order.contains(&temp_id) {
            self.order.push(temp_id);
        }
    }

    pub fn remove(&mut self, temp_id: TempId) -> bool {
        let before = self.order.len();
        self.order.retain(|id| *id != temp_id);
        self.order.len() != before
    }

    /// Move `temp_id` to `new_index`, keeping the relative order of every
    /// other entry. Indices past the end move the item to the end.
    pub fn move_to(&mut self, temp_id: TempId, new_index: usize) -> bool {
        let Some(current) = self.position(temp_id) else {
            return false;
        };
        let item = self.order.remove(current);
        let target = new_index.min(self.order.len());
        self.order.insert(target, item);
        true
    }

    pub fn position(&self, temp_id: TempId) -> Option<usize> {
        self.order.iter().position(|id| *id == temp_id)
    }

    pub fn order(&self) -> &[TempId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Steps with their 1-based numbers, computed from current position
    pub fn numbered<'a>(
        &'a self,
        registry: &'a ComponentRegistry,
    ) -> impl Iterator<Item = (u32, &'a DraftComponent)> + 'a {
        self.order
            .iter()
            .filter_map(|id| registry.get(*id))
            .enumerate()
            .map(|(index, component)| (index as u32 + 1, component))
    }
}
