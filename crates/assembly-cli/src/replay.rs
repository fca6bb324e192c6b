//! Headless plan playback in the terminal

use std::time::Duration;

use assembly_core::{AssemblyPlan, Transition};
use assembly_scene::{PlaybackSession, SceneModel};
use tracing::debug;

/// Frame step used to run each focus move to completion
const FRAME: Duration = Duration::from_millis(16);

/// Walks a [`PlaybackSession`] one step at a time and describes each screen
pub struct Replay {
    player: PlaybackSession,
    settle: Duration,
}

impl Replay {
    /// `settle` is how long to run the camera after each step, normally the focus duration
    pub fn start(mut player: PlaybackSession, plan: AssemblyPlan, model: SceneModel, settle: Duration) -> Self {
        player.start(plan, model);
        let mut replay = Self { player, settle };
        replay.settle_camera();
        replay
    }

    pub fn is_complete(&self) -> bool {
        self.player.is_complete()
    }

    /// What the station screen shows right now
    pub fn screen(&self) -> String {
        let number = self.player.status_number();
        let text = self.player.status_text();
        let mut line = if number.is_empty() {
            text
        } else {
            format!("[{}] {}", number, text)
        };
        if let Some(step) = self.player.current_step() {
            line.push_str(&format!("  (mesh {})", step.mesh_id));
            if self.player.scene.find_mesh(&step.mesh_id).is_none() {
                line.push_str(" [not in model]");
            }
        }
        line
    }

    /// Press Next; returns false once there was nothing left to advance
    pub fn next(&mut self) -> bool {
        let transition = self.player.advance();
        self.settle_camera();
        !matches!(transition, Transition::Ignored)
    }

    fn settle_camera(&mut self) {
        let mut elapsed = Duration::ZERO;
        while elapsed <= self.settle {
            self.player.tick(FRAME);
            elapsed += FRAME;
        }
        let camera = &self.player.scene.camera;
        debug!(target = ?camera.target, position = ?camera.position, "Camera settled");
    }
}
