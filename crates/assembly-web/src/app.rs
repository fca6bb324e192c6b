//! Bevy application setup

use std::time::Duration;

use assembly_core::ProductId;
use assembly_scene::{
    EditorSession, EditorSettings, Label, PlaybackSession, PlayerSettings, SceneManager, Viewport,
};
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;

use crate::network::NetworkPlugin;
use crate::scene::ScenePlugin;
use crate::ui::UiPlugin;

/// Which page the URL asked for
#[derive(Debug, Clone, PartialEq, Eq, Resource)]
pub enum LaunchMode {
    /// `?product_id=N`; `None` when the id is missing or not a number
    Editor { product_id: Option<ProductId> },
    /// `?station=NAME`
    Player { station: Option<String> },
}

impl Default for LaunchMode {
    fn default() -> Self {
        LaunchMode::Player { station: None }
    }
}

/// The active session; every system reads and writes it
#[derive(Resource)]
pub enum Workbench {
    Editor(EditorSession),
    Player(PlaybackSession),
}

impl Workbench {
    pub fn for_mode(mode: &LaunchMode) -> Self {
        let viewport = Viewport::default();
        match mode {
            LaunchMode::Editor { product_id } => {
                let mut editor = EditorSession::new(EditorSettings::default(), viewport);
                if product_id.is_none() {
                    editor.set_message("Product ID is missing");
                }
                Workbench::Editor(editor)
            }
            LaunchMode::Player { .. } => {
                Workbench::Player(PlaybackSession::new(PlayerSettings::default(), viewport))
            }
        }
    }

    pub fn scene(&self) -> &SceneManager {
        match self {
            Workbench::Editor(editor) => &editor.scene,
            Workbench::Player(player) => &player.scene,
        }
    }

    pub fn scene_mut(&mut self) -> &mut SceneManager {
        match self {
            Workbench::Editor(editor) => &mut editor.scene,
            Workbench::Player(player) => &mut player.scene,
        }
    }

    pub fn labels(&self) -> &[Label] {
        match self {
            Workbench::Editor(editor) => editor.labels(),
            Workbench::Player(player) => player.labels(),
        }
    }

    pub fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        match self {
            Workbench::Editor(editor) => editor.orbit(delta_azimuth, delta_elevation),
            Workbench::Player(player) => player.orbit(delta_azimuth, delta_elevation),
        }
    }

    pub fn zoom(&mut self, factor: f32) {
        match self {
            Workbench::Editor(editor) => editor.zoom(factor),
            Workbench::Player(player) => player.zoom(factor),
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        match self {
            Workbench::Editor(editor) => editor.tick(dt),
            Workbench::Player(player) => player.tick(dt),
        }
    }
}

/// Text fields and notices owned by the editor panel
#[derive(Debug, Clone, Resource, Default)]
pub struct EditorForm {
    pub component_name: String,
    pub plan_name: String,
    /// Last validation or save result shown under the form
    pub notice: Option<String>,
}

pub fn run() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.1)))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Assembly Instructions".to_string(),
                        canvas: Some("#assembly-canvas".to_string()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: "".to_string(),
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // Must come before EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .init_resource::<EditorForm>()
        .add_plugins(NetworkPlugin)
        .add_plugins(ScenePlugin)
        .add_plugins(UiPlugin)
        .run();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_product_id_shows_message() {
        let workbench = Workbench::for_mode(&LaunchMode::Editor { product_id: None });
        match workbench {
            Workbench::Editor(editor) => assert_eq!(editor.message(), Some("Product ID is missing")),
            Workbench::Player(_) => panic!("expected the editor"),
        }
    }

    #[test]
    fn test_player_starts_without_model() {
        let workbench = Workbench::for_mode(&LaunchMode::Player {
            station: Some("WS-01".to_string()),
        });
        assert!(matches!(workbench, Workbench::Player(_)));
        assert!(!workbench.scene().has_model());
        assert!(workbench.labels().is_empty());
    }
}
