//! Plan editor state
//!
//! Composes the scene, picker, draft registry, step order, labels, and camera
//! animation behind plain input methods. A renderer feeds pointer events and
//! frame times in and draws whatever this exposes; it holds no logic itself.

use std::time::Duration;

use assembly_core::{
    ComponentRegistry, DraftComponent, DraftPlan, PlanPersistor, Product, SavePhase,
    StepSequencer, TempId, ValidationError,
};
use tracing::{info, warn};

use crate::focus::{CameraFocusAnimator, DEFAULT_DISTANCE_FACTOR, DEFAULT_FOCUS_DURATION};
use crate::labels::{Label, LabelProjector};
use crate::models::ModelLoadError;
use crate::picker::{ClickGesture, Picker, DEFAULT_LONG_PRESS};
use crate::scene::{NodeId, SceneManager, SceneModel, Viewport};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorSettings {
    /// Presses held at least this long rotate the camera instead of selecting
    pub long_press: Duration,
    pub focus_duration: Duration,
    pub distance_factor: f32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            long_press: DEFAULT_LONG_PRESS,
            focus_duration: DEFAULT_FOCUS_DURATION,
            distance_factor: DEFAULT_DISTANCE_FACTOR,
        }
    }
}

pub struct EditorSession {
    pub scene: SceneManager,
    picker: Picker,
    gesture: ClickGesture,
    registry: ComponentRegistry,
    sequencer: StepSequencer,
    labels: LabelProjector,
    focus: CameraFocusAnimator,
    persistor: PlanPersistor,
    product: Option<Product>,
    message: Option<String>,
}

impl EditorSession {
    pub fn new(settings: EditorSettings, viewport: Viewport) -> Self {
        Self {
            scene: SceneManager::new(viewport),
            picker: Picker::new(),
            gesture: ClickGesture::new(settings.long_press),
            registry: ComponentRegistry::new(),
            sequencer: StepSequencer::new(),
            labels: LabelProjector::new(),
            focus: CameraFocusAnimator::new(settings.focus_duration, settings.distance_factor),
            persistor: PlanPersistor::new(),
            product: None,
            message: None,
        }
    }

    pub fn set_product(&mut self, product: Product) {
        if product.model_path.as_deref().is_none_or(str::is_empty) {
            self.message = Some("This product has no 3D model yet. Upload a model first.".to_string());
        }
        info!(product_id = product.id, name = %product.name, "Editing product");
        self.product = Some(product);
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    /// Replace the model; the draft belongs to the old model and is discarded
    pub fn load_model(&mut self, model: SceneModel) {
        self.scene.replace_model(model);
        self.picker.reset();
        self.registry.clear();
        self.sequencer.clear();
        self.labels.clear();
        self.message = None;
    }

    /// Record a failed model load; the scene is left without a model
    pub fn model_failed(&mut self, error: &ModelLoadError) {
        warn!(error = %error, "Model load failed");
        self.scene.clear_model();
        self.picker.reset();
        self.labels.clear();
        self.message = Some(format!("Error loading 3D model: {}", error));
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn pointer_down(&mut self, now: Duration) {
        self.gesture.pointer_down(now);
    }

    /// Finish a press; a short press selects whatever is under the pointer
    pub fn pointer_up(&mut self, x: f32, y: f32, now: Duration) -> Option<NodeId> {
        if !self.gesture.pointer_up(now) || !self.scene.has_model() {
            return None;
        }
        self.picker.click(&mut self.scene, x, y)
    }

    /// True while a held press should drive the camera
    pub fn is_dragging(&self, now: Duration) -> bool {
        self.gesture.is_long_press(now)
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.picker.selected()
    }

    pub fn selected_name(&self) -> &str {
        self.picker.selected_name(&self.scene)
    }

    /// Turn the current selection into a draft component and append it as a step
    pub fn add_selected_component(&mut self, name: &str) -> Result<TempId, ValidationError> {
        let mesh = self
            .picker
            .selected()
            .and_then(|id| self.scene.node(id))
            .map(|n| n.name.clone());
        let temp_id = self.registry.add_selected(name, mesh.as_deref())?.temp_id;
        self.sequencer.push(temp_id);
        self.refresh_labels();
        Ok(temp_id)
    }

    pub fn remove_component(&mut self, temp_id: TempId) -> bool {
        let removed = self.registry.remove(temp_id).is_some();
        self.sequencer.remove(temp_id);
        self.refresh_labels();
        removed
    }

    pub fn move_step(&mut self, temp_id: TempId, new_index: usize) -> bool {
        let moved = self.sequencer.move_to(temp_id, new_index);
        if moved {
            self.refresh_labels();
        }
        moved
    }

    pub fn components(&self) -> &[DraftComponent] {
        self.registry.components()
    }

    /// Steps with their current numbers
    pub fn steps(&self) -> Vec<(u32, &DraftComponent)> {
        self.sequencer.numbered(&self.registry).collect()
    }

    /// Animate the camera onto a drafted component's mesh
    pub fn focus_component(&mut self, temp_id: TempId) -> bool {
        let Some(bounds) = self
            .registry
            .get(temp_id)
            .and_then(|c| self.scene.find_mesh(&c.mesh_id))
            .and_then(|id| self.scene.node(id))
            .map(|n| n.bounds)
        else {
            return false;
        };
        self.focus.focus(&mut self.scene.camera, &bounds);
        true
    }

    pub fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.scene.camera.orbit(delta_azimuth, delta_elevation);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.scene.camera.zoom(factor);
    }

    /// Snapshot for saving; `None` until a product is known
    pub fn draft_plan(&self, name: Option<&str>) -> Option<DraftPlan> {
        let product = self.product.as_ref()?;
        Some(DraftPlan::snapshot(
            product.id,
            name,
            &self.registry,
            &self.sequencer,
        ))
    }

    /// Shared handle the save task reports progress through
    pub fn persistor(&self) -> &PlanPersistor {
        &self.persistor
    }

    pub fn save_phase(&self) -> SavePhase {
        self.persistor.phase()
    }

    pub fn labels(&self) -> &[Label] {
        self.labels.labels()
    }

    /// Per-frame update: camera animation first, then label placement
    pub fn tick(&mut self, dt: Duration) {
        self.focus.tick(&mut self.scene.camera, dt);
        self.labels.update(&self.scene);
    }

    fn refresh_labels(&mut self) {
        self.labels.clear();
        for (number, component) in self.sequencer.numbered(&self.registry) {
            if let Some(node) = self.scene.find_mesh(&component.mesh_id) {
                self.labels.attach(node, number.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialId;
    use crate::scene::MeshNode;
    use glam::Vec3;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn editor() -> EditorSession {
        let mut editor = EditorSession::new(EditorSettings::default(), Viewport::new(800.0, 600.0));
        editor.set_product(Product {
            id: 7,
            name: "Cart".to_string(),
            description: None,
            model_path: Some("/static/cart.glb".to_string()),
        });
        editor.load_model(SceneModel::new(vec![
            MeshNode::cuboid("Wheel-L", Vec3::new(-2.0, 0.0, 0.0), Vec3::splat(0.5)),
            MeshNode::cuboid("Wheel-R", Vec3::new(2.0, 0.0, 0.0), Vec3::splat(0.5)),
        ]));
        editor.scene.camera.position = Vec3::new(0.0, 0.0, 10.0);
        editor.scene.camera.target = Vec3::ZERO;
        editor
    }

    /// Pixel of a world point for the current camera
    fn screen_of(editor: &EditorSession, point: Vec3) -> (f32, f32) {
        match crate::labels::project_to_screen(
            &editor.scene.camera.view_projection(),
            point,
            editor.scene.viewport(),
        ) {
            crate::labels::LabelPlacement::At { x, y } => (x, y),
            crate::labels::LabelPlacement::Hidden => panic!("point is off screen"),
        }
    }

    #[test]
    fn test_click_selects_but_long_press_does_not() {
        let mut editor = editor();
        let (x, y) = screen_of(&editor, Vec3::new(-2.1, 0.1, 0.5));

        editor.pointer_down(ms(0));
        assert_eq!(editor.pointer_up(x, y, ms(350)), None);
        assert_eq!(editor.selected_name(), "None");

        editor.pointer_down(ms(1_000));
        assert_eq!(editor.pointer_up(x, y, ms(1_080)), Some(NodeId(0)));
        assert_eq!(editor.selected_name(), "Wheel-L");
        assert_eq!(editor.scene.material(NodeId(0)), Some(MaterialId::Highlight));
    }

    #[test]
    fn test_add_components_and_number_steps() {
        let mut editor = editor();
        assert_eq!(
            editor.add_selected_component("Left wheel"),
            Err(ValidationError::NoSelection)
        );

        let (x, y) = screen_of(&editor, Vec3::new(-2.1, 0.1, 0.5));
        editor.pointer_down(ms(0));
        editor.pointer_up(x, y, ms(10));
        let left = editor.add_selected_component(" Left wheel ").unwrap();
        assert_eq!(
            editor.add_selected_component("Again"),
            Err(ValidationError::DuplicateMesh("Wheel-L".to_string()))
        );

        let (x, y) = screen_of(&editor, Vec3::new(2.1, 0.1, 0.5));
        editor.pointer_down(ms(100));
        editor.pointer_up(x, y, ms(110));
        editor.add_selected_component("Right wheel").unwrap();

        assert!(editor.move_step(left, 1));
        let steps: Vec<(u32, &str)> = editor
            .steps()
            .into_iter()
            .map(|(n, c)| (n, c.mesh_id.as_str()))
            .collect();
        assert_eq!(steps, vec![(1, "Wheel-R"), (2, "Wheel-L")]);

        let label_texts: Vec<(NodeId, &str)> = editor
            .labels()
            .iter()
            .map(|l| (l.node, l.text.as_str()))
            .collect();
        assert_eq!(label_texts, vec![(NodeId(1), "1"), (NodeId(0), "2")]);

        let draft = editor.draft_plan(None).unwrap();
        assert_eq!(draft.name, "Assembly Plan for Product #7");
        assert_eq!(draft.components.len(), 2);
        assert_eq!(draft.order[1], left);
    }

    #[test]
    fn test_reload_discards_draft_and_selection() {
        let mut editor = editor();
        let (x, y) = screen_of(&editor, Vec3::new(-2.1, 0.1, 0.5));
        editor.pointer_down(ms(0));
        editor.pointer_up(x, y, ms(10));
        editor.add_selected_component("Left wheel").unwrap();

        editor.load_model(SceneModel::new(vec![MeshNode::cuboid(
            "Panel",
            Vec3::ZERO,
            Vec3::ONE,
        )]));
        assert!(editor.components().is_empty());
        assert!(editor.labels().is_empty());
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn test_focus_component_animates_camera() {
        let mut editor = editor();
        let (x, y) = screen_of(&editor, Vec3::new(2.1, 0.1, 0.5));
        editor.pointer_down(ms(0));
        editor.pointer_up(x, y, ms(10));
        let right = editor.add_selected_component("Right wheel").unwrap();

        assert!(editor.focus_component(right));
        assert!(!editor.scene.camera.controls_enabled);
        editor.tick(ms(800));
        assert!(editor.scene.camera.controls_enabled);
        assert!((editor.scene.camera.target - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
        assert!(!editor.focus_component(TempId::new(999)));
    }

    #[test]
    fn test_product_without_model_shows_message() {
        let mut editor = EditorSession::new(EditorSettings::default(), Viewport::new(800.0, 600.0));
        editor.set_product(Product {
            id: 1,
            name: "Bare".to_string(),
            description: None,
            model_path: None,
        });
        assert!(editor.message().unwrap().contains("Upload a model"));
        assert!(editor.draft_plan(None).is_some());
    }
}
