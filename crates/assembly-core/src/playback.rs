//! Step-by-step replay of a saved plan
//!
//! The engine is a forward-only state machine. It reports what changed on
//! each advance; applying that to a scene is the caller's job.

use tracing::{debug, info};

use crate::model::{ActionType, AssemblyPlan};

pub const COMPLETE_TEXT: &str = "Assembly complete!";
pub const COMPLETE_MARK: &str = "✓";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    NotStarted,
    /// Index into the sorted step list
    AtStep(usize),
    Complete,
}

/// Display data for the step being shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub index: usize,
    pub step_number: u32,
    pub action_type: ActionType,
    pub component_name: String,
    pub mesh_id: String,
}

impl StepView {
    /// `<action>: <component>`
    pub fn text(&self) -> String {
        format!("{}: {}", self.action_type, self.component_name)
    }
}

/// Result of one [`PlaybackEngine::advance`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A new step is current; `completed` is the mesh of the step just left
    Entered {
        completed: Option<String>,
        step: StepView,
    },
    /// The last step was left and the plan is done
    Finished { completed: Option<String> },
    /// Already complete; nothing changed
    Ignored,
}

#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    plan: AssemblyPlan,
    state: PlaybackState,
}

impl PlaybackEngine {
    pub fn new(mut plan: AssemblyPlan) -> Self {
        plan.sort_steps();
        info!(plan = %plan.name, steps = plan.steps.len(), "Loaded plan for playback");
        Self {
            plan,
            state: PlaybackState::NotStarted,
        }
    }

    pub fn plan(&self) -> &AssemblyPlan {
        &self.plan
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.plan.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plan.steps.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.state == PlaybackState::Complete
    }

    /// The Next control is shown until the plan completes
    pub fn advance_visible(&self) -> bool {
        !self.is_complete()
    }

    pub fn current_step(&self) -> Option<StepView> {
        match self.state {
            PlaybackState::AtStep(index) => self.view(index),
            _ => None,
        }
    }

    /// Text for the step-number display
    pub fn status_number(&self) -> String {
        match self.state {
            PlaybackState::NotStarted => String::new(),
            PlaybackState::AtStep(index) => self
                .view(index)
                .map(|v| v.step_number.to_string())
                .unwrap_or_default(),
            PlaybackState::Complete => COMPLETE_MARK.to_string(),
        }
    }

    /// Text for the action display
    pub fn status_text(&self) -> String {
        match self.state {
            PlaybackState::NotStarted => String::new(),
            PlaybackState::AtStep(index) => {
                self.view(index).map(|v| v.text()).unwrap_or_default()
            }
            PlaybackState::Complete => COMPLETE_TEXT.to_string(),
        }
    }

    pub fn advance(&mut self) -> Transition {
        let (completed, next) = match self.state {
            PlaybackState::Complete => return Transition::Ignored,
            PlaybackState::NotStarted => (None, 0),
            PlaybackState::AtStep(index) => (
                self.plan
                    .steps
                    .get(index)
                    .map(|s| s.component.mesh_id.clone()),
                index + 1,
            ),
        };

        match self.view(next) {
            Some(step) => {
                debug!(step = step.step_number, mesh = %step.mesh_id, "Entered step");
                self.state = PlaybackState::AtStep(next);
                Transition::Entered { completed, step }
            }
            None => {
                info!(plan = %self.plan.name, "Assembly complete");
                self.state = PlaybackState::Complete;
                Transition::Finished { completed }
            }
        }
    }

    fn view(&self, index: usize) -> Option<StepView> {
        self.plan.steps.get(index).map(|step| StepView {
            index,
            step_number: step.step_number,
            action_type: step.action_type.clone(),
            component_name: step.component.name.clone(),
            mesh_id: step.component.mesh_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssemblyStep, PlanComponent};

    fn plan(meshes: &[(&str, &str)]) -> AssemblyPlan {
        AssemblyPlan {
            id: None,
            name: "Test plan".to_string(),
            steps: meshes
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

    #[test]
    fn test_k_advances_reach_complete() {
        for k in 0..4 {
            let meshes: Vec<(String, String)> =
                (0..k).map(|i| (format!("Part {i}"), format!("m{i}"))).collect();
            let pairs: Vec<(&str, &str)> = meshes
                .iter()
                .map(|(a, b)| (a.as_str(), b.as_str()))
                .collect();
            let mut engine = PlaybackEngine::new(plan(&pairs));
            assert_eq!(engine.state(), PlaybackState::NotStarted);

            for i in 0..k {
                assert!(matches!(engine.advance(), Transition::Entered { .. }));
                assert_eq!(engine.state(), PlaybackState::AtStep(i));
            }
            assert!(matches!(engine.advance(), Transition::Finished { .. }));
            assert!(engine.is_complete());
            assert!(!engine.advance_visible());

            assert_eq!(engine.advance(), Transition::Ignored);
            assert_eq!(engine.state(), PlaybackState::Complete);
        }
    }

    #[test]
    fn test_wheel_scenario() {
        let mut engine =
            PlaybackEngine::new(plan(&[("Left wheel", "Wheel-L"), ("Right wheel", "Wheel-R")]));

        match engine.advance() {
            Transition::Entered { completed, step } => {
                assert_eq!(completed, None);
                assert_eq!(step.mesh_id, "Wheel-L");
                assert_eq!(step.text(), "Assemble: Left wheel");
            }
            other => panic!("unexpected transition: {other:?}"),
        }
        assert_eq!(engine.status_number(), "1");

        match engine.advance() {
            Transition::Entered { completed, step } => {
                assert_eq!(completed.as_deref(), Some("Wheel-L"));
                assert_eq!(step.mesh_id, "Wheel-R");
                assert_eq!(step.step_number, 2);
            }
            other => panic!("unexpected transition: {other:?}"),
        }

        assert_eq!(
            engine.advance(),
            Transition::Finished {
                completed: Some("Wheel-R".to_string())
            }
        );
        assert_eq!(engine.status_text(), COMPLETE_TEXT);
        assert_eq!(engine.status_number(), COMPLETE_MARK);
    }

    #[test]
    fn test_steps_are_played_in_step_number_order() {
        let mut unordered = plan(&[("A", "a"), ("B", "b")]);
        unordered.steps.reverse();
        let mut engine = PlaybackEngine::new(unordered);
        match engine.advance() {
            Transition::Entered { step, .. } => assert_eq!(step.mesh_id, "a"),
            other => panic!("unexpected transition: {other:?}"),
        }
    }
}
