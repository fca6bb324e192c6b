//! UI overlays using bevy_egui

use assembly_core::{SavePhase, TempId};
use assembly_scene::{EditorSession, Label, LabelPlacement, PlaybackSession};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::app::{EditorForm, Workbench};
use crate::network::{save_plan, BackendConfig, PendingEvents};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        // Runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
        app.add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// A step-list button press, applied after the list is drawn
enum StepAction {
    Move(TempId, usize),
    Focus(TempId),
    Remove(TempId),
}

fn ui_system(
    mut contexts: EguiContexts,
    mut workbench: ResMut<Workbench>,
    mut form: ResMut<EditorForm>,
    config: Res<BackendConfig>,
    pending: Res<PendingEvents>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    match &mut *workbench {
        Workbench::Editor(editor) => editor_panel(ctx, editor, &mut form, &config, &pending),
        Workbench::Player(player) => playback_panel(ctx, player),
    }
    draw_labels(ctx, workbench.labels());
}

fn editor_panel(
    ctx: &egui::Context,
    editor: &mut EditorSession,
    form: &mut EditorForm,
    config: &BackendConfig,
    pending: &PendingEvents,
) {
    egui::SidePanel::left("editor_panel")
        .default_width(320.0)
        .show(ctx, |ui| {
            ui.heading("Assembly Plan Editor");
            if let Some(product) = editor.product() {
                ui.label(format!("Product: {}", product.name));
            }
            if let Some(message) = editor.message() {
                ui.colored_label(egui::Color32::YELLOW, message);
            }

            ui.separator();
            ui.label(format!("Selected mesh: {}", editor.selected_name()));
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut form.component_name)
                        .hint_text("Component name"),
                );
                if ui.button("Add").clicked() {
                    match editor.add_selected_component(&form.component_name) {
                        Ok(_) => {
                            form.component_name.clear();
                            form.notice = None;
                        }
                        Err(e) => form.notice = Some(e.to_string()),
                    }
                }
            });

            let mut action = None;

            ui.separator();
            ui.strong("Components");
            for component in editor.components() {
                ui.horizontal(|ui| {
                    ui.label(format!("{} (ID: {})", component.name, component.mesh_id));
                    if ui.small_button("✕").clicked() {
                        action = Some(StepAction::Remove(component.temp_id));
                    }
                });
            }

            ui.separator();
            ui.strong("Assembly steps");
            let steps = editor.steps();
            let count = steps.len();
            for (index, (number, component)) in steps.iter().enumerate() {
                ui.horizontal(|ui| {
                    ui.label(format!("{}. {}", number, component.name));
                    if ui
                        .add_enabled(index > 0, egui::Button::new("⬆").small())
                        .clicked()
                    {
                        action = Some(StepAction::Move(component.temp_id, index - 1));
                    }
                    if ui
                        .add_enabled(index + 1 < count, egui::Button::new("⬇").small())
                        .clicked()
                    {
                        action = Some(StepAction::Move(component.temp_id, index + 1));
                    }
                    if ui.small_button("Focus").clicked() {
                        action = Some(StepAction::Focus(component.temp_id));
                    }
                });
            }

            match action {
                Some(StepAction::Move(id, to)) => {
                    editor.move_step(id, to);
                }
                Some(StepAction::Focus(id)) => {
                    editor.focus_component(id);
                }
                Some(StepAction::Remove(id)) => {
                    editor.remove_component(id);
                }
                None => {}
            }

            ui.separator();
            ui.add(egui::TextEdit::singleline(&mut form.plan_name).hint_text("Plan name"));

            let phase = editor.save_phase();
            let can_save = !phase.is_busy() && editor.product().is_some();
            if ui
                .add_enabled(can_save, egui::Button::new("Save Assembly Plan"))
                .clicked()
            {
                if let Some(draft) = editor.draft_plan(Some(&form.plan_name)) {
                    form.notice = None;
                    save_plan(config, editor.persistor(), draft, pending);
                }
            }
            match phase {
                SavePhase::Authorizing => {
                    ui.label("Checking session...");
                }
                SavePhase::SavingComponents { done, total } => {
                    ui.label(format!("Saving components... ({}/{})", done, total));
                }
                SavePhase::SavingPlan => {
                    ui.label("Saving plan...");
                }
                SavePhase::Idle | SavePhase::Done(_) | SavePhase::Failed(_) => {}
            }
            if let Some(notice) = &form.notice {
                ui.label(notice);
            }
        });
}

fn playback_panel(ctx: &egui::Context, player: &mut PlaybackSession) {
    egui::TopBottomPanel::bottom("playback_panel")
        .min_height(72.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(egui::RichText::new(player.status_number()).size(36.0).strong());
                ui.label(egui::RichText::new(player.status_text()).size(22.0));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if player.advance_visible()
                        && ui
                            .button(egui::RichText::new("Next Step").size(22.0))
                            .clicked()
                    {
                        player.advance();
                    }
                });
            });
        });
}

/// Step-number badges over their meshes
fn draw_labels(ctx: &egui::Context, labels: &[Label]) {
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("step_labels"),
    ));
    for label in labels {
        let LabelPlacement::At { x, y } = label.placement else {
            continue;
        };
        let center = egui::pos2(x, y);
        painter.circle_filled(center, 14.0, egui::Color32::from_black_alpha(180));
        painter.text(
            center,
            egui::Align2::CENTER_CENTER,
            &label.text,
            egui::FontId::proportional(16.0),
            egui::Color32::WHITE,
        );
    }
}
