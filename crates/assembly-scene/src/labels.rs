//! Screen-space labels pinned to mesh nodes

use glam::{Mat4, Vec3};

use crate::scene::{NodeId, SceneManager, Viewport};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelPlacement {
    /// Behind the camera, or not projected yet
    Hidden,
    /// Pixel position of the label's center
    At { x: f32, y: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub node: NodeId,
    pub text: String,
    pub placement: LabelPlacement,
}

/// Project a world point to pixel coordinates
pub fn project_to_screen(view_projection: &Mat4, point: Vec3, viewport: Viewport) -> LabelPlacement {
    let clip = *view_projection * point.extend(1.0);
    if clip.w <= 0.0 {
        return LabelPlacement::Hidden;
    }
    let ndc = clip.truncate() / clip.w;
    if ndc.z > 1.0 {
        return LabelPlacement::Hidden;
    }
    LabelPlacement::At {
        x: (ndc.x * 0.5 + 0.5) * viewport.width,
        y: (-ndc.y * 0.5 + 0.5) * viewport.height,
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelProjector {
    labels: Vec<Label>,
}

impl LabelProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, node: NodeId, text: impl Into<String>) {
        self.labels.push(Label {
            node,
            text: text.into(),
            placement: LabelPlacement::Hidden,
        });
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Reposition every label; run after the camera has moved for this frame
    pub fn update(&mut self, scene: &SceneManager) {
        let view_projection = scene.camera.view_projection();
        let viewport = scene.viewport();
        for label in &mut self.labels {
            label.placement = match scene.node(label.node) {
                Some(node) => project_to_screen(&view_projection, node.origin(), viewport),
                None => LabelPlacement::Hidden,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshNode, SceneModel};

    fn scene_with(center: Vec3) -> SceneManager {
        let mut scene = SceneManager::new(Viewport::new(800.0, 600.0));
        scene.replace_model(SceneModel::new(vec![MeshNode::cuboid(
            "Bolt",
            center,
            Vec3::splat(0.5),
        )]));
        scene.camera.position = Vec3::new(0.0, 0.0, 10.0);
        scene.camera.target = Vec3::ZERO;
        scene.camera.near = 0.1;
        scene.camera.far = 100.0;
        scene
    }

    #[test]
    fn test_label_in_front_is_placed_on_screen() {
        let scene = scene_with(Vec3::ZERO);
        let mut labels = LabelProjector::new();
        labels.attach(NodeId(0), "1");
        assert_eq!(labels.labels()[0].placement, LabelPlacement::Hidden);

        labels.update(&scene);
        match labels.labels()[0].placement {
            LabelPlacement::At { x, y } => {
                assert!((x - 400.0).abs() < 1e-3);
                assert!((y - 300.0).abs() < 1e-3);
            }
            LabelPlacement::Hidden => panic!("label should be visible"),
        }
    }

    #[test]
    fn test_label_above_center_has_smaller_y() {
        let scene = scene_with(Vec3::new(0.0, 2.0, 0.0));
        let mut labels = LabelProjector::new();
        labels.attach(NodeId(0), "1");
        labels.update(&scene);
        match labels.labels()[0].placement {
            LabelPlacement::At { y, .. } => assert!(y < 300.0),
            LabelPlacement::Hidden => panic!("label should be visible"),
        }
    }

    #[test]
    fn test_label_behind_camera_is_hidden() {
        let scene = scene_with(Vec3::new(0.0, 0.0, 20.0));
        let mut labels = LabelProjector::new();
        labels.attach(NodeId(0), "1");
        labels.attach(NodeId(7), "ghost");
        labels.update(&scene);
        assert!(labels
            .labels()
            .iter()
            .all(|l| l.placement == LabelPlacement::Hidden));
    }
}
