//! Mesh picking with reversible highlighting
//!
//! At most one mesh is highlighted at a time. The first time a mesh is
//! selected its material is remembered; deselecting always restores that
//! first-captured material, so repeated selections never stack highlights.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::geometry::{ray_aabb, ray_triangle};
use crate::materials::MaterialId;
use crate::scene::{NodeId, SceneManager};

/// Shown when nothing is selected
pub const NO_SELECTION: &str = "None";

pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    pub node: NodeId,
    pub distance: f32,
}

/// Nearest mesh under a pixel
pub fn pick(scene: &SceneManager, screen_x: f32, screen_y: f32) -> Option<MeshHit> {
    let model = scene.model()?;
    let ray = scene.ray_from_screen(screen_x, screen_y)?;

    let mut best: Option<MeshHit> = None;
    for (index, node) in model.nodes().iter().enumerate() {
        let Some(box_distance) = ray_aabb(&ray, &node.bounds) else {
            continue;
        };
        if best.is_some_and(|b| box_distance > b.distance) {
            continue;
        }
        for [v0, v1, v2] in node.triangles() {
            if let Some(distance) = ray_triangle(&ray, v0, v1, v2) {
                if best.is_none_or(|b| distance < b.distance) {
                    best = Some(MeshHit {
                        node: NodeId(index),
                        distance,
                    });
                }
            }
        }
    }
    best
}

/// Tells a click from a long press (camera drag)
#[derive(Debug, Clone)]
pub struct ClickGesture {
    threshold: Duration,
    pressed_at: Option<Duration>,
}

impl Default for ClickGesture {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_PRESS)
    }
}

impl ClickGesture {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            pressed_at: None,
        }
    }

    /// `now` is any monotonic clock reading
    pub fn pointer_down(&mut self, now: Duration) {
        self.pressed_at = Some(now);
    }

    /// True when the press was short enough to count as a click
    pub fn pointer_up(&mut self, now: Duration) -> bool {
        match self.pressed_at.take() {
            Some(pressed) => now.saturating_sub(pressed) < self.threshold,
            None => false,
        }
    }

    /// True once the press has been held past the threshold
    pub fn is_long_press(&self, now: Duration) -> bool {
        self.pressed_at
            .is_some_and(|pressed| now.saturating_sub(pressed) >= self.threshold)
    }
}

/// Selection state plus the original-material record
#[derive(Debug, Clone, Default)]
pub struct Picker {
    selected: Option<NodeId>,
    originals: HashMap<NodeId, MaterialId>,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Name of the selected mesh, or [`NO_SELECTION`]
    pub fn selected_name<'a>(&self, scene: &'a SceneManager) -> &'a str {
        self.selected
            .and_then(|id| scene.node(id))
            .map(|n| n.name.as_str())
            .unwrap_or(NO_SELECTION)
    }

    /// Material the mesh had before it was first highlighted
    pub fn original(&self, node: NodeId) -> Option<MaterialId> {
        self.originals.get(&node).copied()
    }

    /// Pick at a pixel and select whatever was hit (or clear on a miss)
    pub fn click(&mut self, scene: &mut SceneManager, screen_x: f32, screen_y: f32) -> Option<NodeId> {
        let hit = pick(scene, screen_x, screen_y).map(|h| h.node);
        self.select(scene, hit);
        hit
    }

    /// Move the highlight to `hit`, restoring the previous selection first
    pub fn select(&mut self, scene: &mut SceneManager, hit: Option<NodeId>) {
        if let Some(previous) = self.selected.take() {
            match self.originals.get(&previous) {
                Some(material) => {
                    scene.set_material(previous, *material);
                }
                None => warn!(node = previous.0, "No original material recorded for selection"),
            }
        }

        let Some(node) = hit else {
            debug!("Selection cleared");
            return;
        };
        let Some(current) = scene.material(node) else {
            warn!(node = node.0, "Picked node is not in the scene");
            return;
        };
        self.originals.entry(node).or_insert(current);
        scene.set_material(node, MaterialId::Highlight);
        self.selected = Some(node);
        debug!(mesh = %self.selected_name(scene), "Selected mesh");
    }

    /// Drop selection and all remembered materials (new model loaded)
    pub fn reset(&mut self) {
        self.selected = None;
        self.originals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshNode, SceneModel, Viewport};
    use glam::{Mat4, Vec3};

    /// Three cubes in a row along X, camera looking down -Z at the middle one
    fn scene() -> SceneManager {
        let mut scene = SceneManager::new(Viewport::new(800.0, 600.0));
        scene.replace_model(SceneModel::new(vec![
            MeshNode::cuboid("Left", Vec3::new(-3.0, 0.0, 0.0), Vec3::splat(0.5)),
            MeshNode::cuboid("Middle", Vec3::ZERO, Vec3::splat(0.5)),
            MeshNode::cuboid("Right", Vec3::new(3.0, 0.0, 0.0), Vec3::splat(0.5)),
        ]));
        scene.camera.position = Vec3::new(0.0, 0.0, 10.0);
        scene.camera.target = Vec3::ZERO;
        scene.camera.near = 0.1;
        scene.camera.far = 100.0;
        scene
    }

    fn highlighted(scene: &SceneManager) -> usize {
        scene
            .model()
            .unwrap()
            .nodes()
            .iter()
            .filter(|n| n.material == MaterialId::Highlight)
            .count()
    }

    #[test]
    fn test_pick_center_hits_middle() {
        let scene = scene();
        let hit = pick(&scene, 410.0, 290.0).unwrap();
        assert_eq!(hit.node, NodeId(1));
        assert!((hit.distance - 9.5).abs() < 0.05);

        assert!(pick(&scene, 400.0, 5.0).is_none());
    }

    #[test]
    fn test_pick_prefers_nearest() {
        let mut scene = SceneManager::new(Viewport::new(800.0, 600.0));
        scene.replace_model(SceneModel::new(vec![
            MeshNode::cuboid("Back", Vec3::new(0.0, 0.0, -2.0), Vec3::splat(0.5)),
            MeshNode::cuboid("Front", Vec3::new(0.0, 0.0, 2.0), Vec3::splat(0.5)),
        ]));
        scene.camera.position = Vec3::new(0.0, 0.0, 10.0);
        scene.camera.target = Vec3::ZERO;
        assert_eq!(pick(&scene, 410.0, 290.0).unwrap().node, NodeId(1));
    }

    #[test]
    fn test_pick_from_inside_a_mesh_bounds() {
        // Panel at z=5 whose mesh also has far-off triangles, so its box
        // surrounds the camera at z=10
        let local = [
            Vec3::new(-1.0, -1.0, 5.0),
            Vec3::new(1.0, -1.0, 5.0),
            Vec3::new(1.0, 1.0, 5.0),
            Vec3::new(-1.0, 1.0, 5.0),
            Vec3::new(10.0, 0.0, 20.0),
            Vec3::new(11.0, 0.0, 20.0),
            Vec3::new(10.0, 1.0, 20.0),
            Vec3::new(10.0, 0.0, -30.0),
            Vec3::new(11.0, 0.0, -30.0),
            Vec3::new(10.0, 1.0, -30.0),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 7, 8, 9];
        let mut scene = SceneManager::new(Viewport::new(800.0, 600.0));
        scene.replace_model(SceneModel::new(vec![
            MeshNode::cuboid("Target", Vec3::ZERO, Vec3::splat(0.5)),
            MeshNode::new("Panel", Mat4::IDENTITY, &local, indices),
        ]));
        scene.camera.position = Vec3::new(0.0, 0.0, 10.0);
        scene.camera.target = Vec3::ZERO;

        let hit = pick(&scene, 410.0, 290.0).unwrap();
        assert_eq!(hit.node, NodeId(1));
        assert!((hit.distance - 5.0).abs() < 0.05);
    }

    #[test]
    fn test_at_most_one_highlight_and_restore_first_material() {
        let mut scene = scene();
        scene.set_material(NodeId(0), MaterialId::Completed);
        let mut picker = Picker::new();

        let sequence = [
            Some(NodeId(0)),
            Some(NodeId(1)),
            Some(NodeId(0)),
            None,
            Some(NodeId(2)),
            Some(NodeId(2)),
            Some(NodeId(0)),
        ];
        for hit in sequence {
            picker.select(&mut scene, hit);
            assert!(highlighted(&scene) <= 1);
            assert_eq!(highlighted(&scene), usize::from(hit.is_some()));
        }

        assert_eq!(picker.original(NodeId(0)), Some(MaterialId::Completed));
        picker.select(&mut scene, None);
        assert_eq!(scene.material(NodeId(0)), Some(MaterialId::Completed));
        assert_eq!(scene.material(NodeId(2)), Some(MaterialId::Default));
        assert_eq!(picker.selected_name(&scene), NO_SELECTION);
    }

    #[test]
    fn test_click_on_empty_space_clears_selection() {
        let mut scene = scene();
        let mut picker = Picker::new();
        assert_eq!(picker.click(&mut scene, 410.0, 290.0), Some(NodeId(1)));
        assert_eq!(picker.selected_name(&scene), "Middle");

        assert_eq!(picker.click(&mut scene, 400.0, 5.0), None);
        assert_eq!(picker.selected(), None);
        assert_eq!(highlighted(&scene), 0);
    }

    #[test]
    fn test_click_versus_long_press() {
        let mut gesture = ClickGesture::default();
        gesture.pointer_down(Duration::from_millis(1_000));
        assert!(!gesture.is_long_press(Duration::from_millis(1_150)));
        assert!(gesture.pointer_up(Duration::from_millis(1_150)));

        gesture.pointer_down(Duration::from_millis(2_000));
        assert!(gesture.is_long_press(Duration::from_millis(2_200)));
        assert!(!gesture.pointer_up(Duration::from_millis(2_250)));

        assert!(!gesture.pointer_up(Duration::from_millis(3_000)));
    }
}
