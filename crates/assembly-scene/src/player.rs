//! Station playback state
//!
//! Drives a [`PlaybackEngine`] and applies each transition to the scene:
//! recolor the finished mesh, highlight and label the next one, and move the
//! camera onto it. A step whose mesh is missing from the model still advances;
//! only the highlight and camera move are skipped.

use std::time::Duration;

use assembly_core::playback::COMPLETE_TEXT;
use assembly_core::{AssemblyPlan, PlaybackEngine, StepView, Transition};
use tracing::{info, warn};

use crate::focus::{CameraFocusAnimator, DEFAULT_DISTANCE_FACTOR, DEFAULT_FOCUS_DURATION};
use crate::labels::{Label, LabelProjector};
use crate::materials::MaterialId;
use crate::models::ModelLoadError;
use crate::scene::{SceneManager, SceneModel, Viewport};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSettings {
    pub focus_duration: Duration,
    pub distance_factor: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            focus_duration: DEFAULT_FOCUS_DURATION,
            distance_factor: DEFAULT_DISTANCE_FACTOR,
        }
    }
}

pub struct PlaybackSession {
    pub scene: SceneManager,
    engine: Option<PlaybackEngine>,
    labels: LabelProjector,
    focus: CameraFocusAnimator,
    error: Option<String>,
}

impl PlaybackSession {
    pub fn new(settings: PlayerSettings, viewport: Viewport) -> Self {
        Self {
            scene: SceneManager::new(viewport),
            engine: None,
            labels: LabelProjector::new(),
            focus: CameraFocusAnimator::new(settings.focus_duration, settings.distance_factor),
            error: None,
        }
    }

    /// Load the model, take the plan, and show the first step
    pub fn start(&mut self, plan: AssemblyPlan, model: SceneModel) -> Transition {
        self.scene.replace_model(model);
        self.labels.clear();
        self.error = None;
        self.engine = Some(PlaybackEngine::new(plan));
        self.advance()
    }

    /// Show an error in place of the step text; playback does not start
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "Playback unavailable");
        self.error = Some(message);
    }

    pub fn model_failed(&mut self, error: &ModelLoadError) {
        self.scene.clear_model();
        self.engine = None;
        self.fail(format!("Error loading 3D model: {}", error));
    }

    pub fn engine(&self) -> Option<&PlaybackEngine> {
        self.engine.as_ref()
    }

    pub fn current_step(&self) -> Option<StepView> {
        self.engine.as_ref()?.current_step()
    }

    pub fn advance(&mut self) -> Transition {
        let Some(engine) = self.engine.as_mut() else {
            return Transition::Ignored;
        };
        let transition = engine.advance();
        self.apply(&transition);
        transition
    }

    pub fn status_number(&self) -> String {
        match (&self.error, &self.engine) {
            (Some(_), _) | (None, None) => String::new(),
            (None, Some(engine)) => engine.status_number(),
        }
    }

    pub fn status_text(&self) -> String {
        match (&self.error, &self.engine) {
            (Some(error), _) => format!("Error: {}", error),
            (None, Some(engine)) => engine.status_text(),
            (None, None) => "Loading...".to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.is_complete())
    }

    /// The Next control is shown only while there is something to advance to
    pub fn advance_visible(&self) -> bool {
        self.error.is_none() && self.engine.as_ref().is_some_and(|e| e.advance_visible())
    }

    pub fn labels(&self) -> &[Label] {
        self.labels.labels()
    }

    pub fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.scene.camera.orbit(delta_azimuth, delta_elevation);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.scene.camera.zoom(factor);
    }

    /// Per-frame update: camera animation first, then label placement
    pub fn tick(&mut self, dt: Duration) {
        self.focus.tick(&mut self.scene.camera, dt);
        self.labels.update(&self.scene);
    }

    fn apply(&mut self, transition: &Transition) {
        match transition {
            Transition::Entered { completed, step } => {
                self.mark_completed(completed.as_deref());
                self.labels.clear();
                match self.scene.find_mesh(&step.mesh_id) {
                    Some(node) => {
                        self.scene.set_material(node, MaterialId::Highlight);
                        self.labels.attach(node, step.step_number.to_string());
                        if let Some(bounds) = self.scene.node(node).map(|n| n.bounds) {
                            self.focus.focus(&mut self.scene.camera, &bounds);
                        }
                    }
                    None => {
                        warn!(mesh = %step.mesh_id, step = step.step_number, "Step mesh not found in model")
                    }
                }
            }
            Transition::Finished { completed } => {
                self.mark_completed(completed.as_deref());
                info!("{}", COMPLETE_TEXT);
            }
            Transition::Ignored => {}
        }
    }

    fn mark_completed(&mut self, mesh_id: Option<&str>) {
        if let Some(node) = mesh_id.and_then(|m| self.scene.find_mesh(m)) {
            self.scene.set_material(node, MaterialId::Completed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshNode, NodeId};
    use assembly_core::model::{AssemblyStep, PlanComponent};
    use assembly_core::ActionType;
    use glam::Vec3;

    fn plan(steps: &[(&str, &str)]) -> AssemblyPlan {
        AssemblyPlan {
            id: Some(1),
            name: "Cart".to_string(),
            steps: steps
                .iter()
                .enumerate()
                .map(|(i, (name, mesh))| AssemblyStep {
                    step_number: i as u32 + 1,
                    action_type: ActionType::Assemble,
                    component: PlanComponent {
                        name: name.to_string(),
                        mesh_id: mesh.to_string(),
                    },
                })
                .collect(),
            product: None,
        }
    }

    fn wheels() -> SceneModel {
        SceneModel::new(vec![
            MeshNode::cuboid("Wheel-L", Vec3::new(-2.0, 0.0, 0.0), Vec3::splat(0.5)),
            MeshNode::cuboid("Wheel-R", Vec3::new(2.0, 0.0, 0.0), Vec3::splat(0.5)),
        ])
    }

    #[test]
    fn test_wheel_playback() {
        let mut player = PlaybackSession::new(PlayerSettings::default(), Viewport::new(800.0, 600.0));
        player.start(
            plan(&[("Left wheel", "Wheel-L"), ("Right wheel", "Wheel-R")]),
            wheels(),
        );

        assert_eq!(player.scene.material(NodeId(0)), Some(MaterialId::Highlight));
        assert_eq!(player.status_number(), "1");
        assert_eq!(player.status_text(), "Assemble: Left wheel");
        assert_eq!(player.labels().len(), 1);
        assert_eq!(player.labels()[0].text, "1");
        assert!(!player.scene.camera.controls_enabled);

        player.tick(Duration::from_secs(1));
        assert!(player.scene.camera.controls_enabled);
        assert!((player.scene.camera.target - Vec3::new(-2.0, 0.0, 0.0)).length() < 1e-5);

        player.advance();
        assert_eq!(player.scene.material(NodeId(0)), Some(MaterialId::Completed));
        assert_eq!(player.scene.material(NodeId(1)), Some(MaterialId::Highlight));
        assert_eq!(player.labels()[0].node, NodeId(1));
        assert_eq!(player.labels()[0].text, "2");

        player.advance();
        assert_eq!(player.scene.material(NodeId(1)), Some(MaterialId::Completed));
        assert_eq!(player.status_text(), "Assembly complete!");
        assert_eq!(player.status_number(), "✓");
        assert!(!player.advance_visible());

        assert_eq!(player.advance(), Transition::Ignored);
    }

    #[test]
    fn test_missing_mesh_still_advances() {
        let mut player = PlaybackSession::new(PlayerSettings::default(), Viewport::new(800.0, 600.0));
        player.start(plan(&[("Ghost", "Nope"), ("Right wheel", "Wheel-R")]), wheels());

        assert_eq!(player.status_text(), "Assemble: Ghost");
        assert!(player.labels().is_empty());
        assert_eq!(player.scene.material(NodeId(0)), Some(MaterialId::Default));
        assert!(player.scene.camera.controls_enabled);

        player.advance();
        assert_eq!(player.status_number(), "2");
        assert_eq!(player.scene.material(NodeId(1)), Some(MaterialId::Highlight));
    }

    #[test]
    fn test_empty_plan_completes_immediately() {
        let mut player = PlaybackSession::new(PlayerSettings::default(), Viewport::new(800.0, 600.0));
        let first = player.start(plan(&[]), wheels());
        assert_eq!(first, Transition::Finished { completed: None });
        assert!(player.is_complete());
    }

    #[test]
    fn test_failure_replaces_step_text() {
        let mut player = PlaybackSession::new(PlayerSettings::default(), Viewport::new(800.0, 600.0));
        player.fail("Workstation name not provided");
        assert_eq!(player.status_text(), "Error: Workstation name not provided");
        assert!(!player.advance_visible());
        assert_eq!(player.advance(), Transition::Ignored);
    }
}
