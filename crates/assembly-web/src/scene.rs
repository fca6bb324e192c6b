//! Draws the session's scene with Bevy and feeds pointer input back into it
//!
//! The headless [`SceneManager`](assembly_scene::SceneManager) is the source of
//! truth for geometry, materials, and the camera. Systems here only mirror it.

use std::collections::HashMap;

use assembly_scene::{glam, MaterialId, MaterialLibrary, MeshNode, NodeId};
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

use crate::app::Workbench;
use crate::network::ModelLoaded;

/// Radians of orbit per pixel of drag
const ORBIT_SENSITIVITY: f32 = 0.005;
/// Distance change per wheel line
const ZOOM_SPEED: f32 = 0.1;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_scene, create_materials))
            .add_systems(
                Update,
                (
                    rebuild_meshes,
                    track_viewport,
                    handle_pointer,
                    tick_session,
                    sync_camera,
                    sync_materials,
                )
                    .chain(),
            );
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Links a rendered entity to its node in the session's scene
#[derive(Component)]
pub struct MeshBinding {
    pub node: NodeId,
}

/// One Bevy material per shared [`MaterialId`]
#[derive(Resource, Default)]
pub struct MaterialHandles(HashMap<MaterialId, Handle<StandardMaterial>>);

impl MaterialHandles {
    pub fn get(&self, id: MaterialId) -> Option<&Handle<StandardMaterial>> {
        self.0.get(&id)
    }
}

fn to_bevy(v: glam::Vec3) -> Vec3 {
    Vec3::from_array(v.to_array())
}

fn setup_scene(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection::default()),
        Transform::from_xyz(0.0, 5.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
        ..default()
    });

    // Key light plus a dimmer fill from the opposite side
    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(10.0, 20.0, 15.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 3000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-10.0, -10.0, -15.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn create_materials(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    let library = MaterialLibrary;
    let handles = MaterialId::ALL
        .into_iter()
        .map(|id| {
            let m = library.get(id);
            let [r, g, b] = m.base_rgb();
            let [er, eg, eb] = m.emissive_rgb();
            let handle = materials.add(StandardMaterial {
                base_color: Color::srgb(r, g, b),
                emissive: LinearRgba::rgb(er, eg, eb),
                metallic: m.metallic,
                perceptual_roughness: m.roughness,
                ..default()
            });
            (id, handle)
        })
        .collect();
    commands.insert_resource(MaterialHandles(handles));
}

/// Flat-shaded render mesh in world space; every triangle gets its own vertices
fn build_mesh(node: &MeshNode) -> Mesh {
    use bevy::asset::RenderAssetUsages;
    use bevy::mesh::Indices;
    use bevy::render::render_resource::PrimitiveTopology;

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    for [a, b, c] in node.triangles() {
        let normal = (b - a).cross(c - a).normalize_or_zero().to_array();
        for v in [a, b, c] {
            positions.push(v.to_array());
            normals.push(normal);
        }
    }
    let indices: Vec<u32> = (0..positions.len() as u32).collect();

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_indices(Indices::U32(indices))
}

/// Respawn render entities whenever the session's model changes
fn rebuild_meshes(
    mut commands: Commands,
    mut events: MessageReader<ModelLoaded>,
    mut meshes: ResMut<Assets<Mesh>>,
    handles: Res<MaterialHandles>,
    workbench: Res<Workbench>,
    existing: Query<Entity, With<MeshBinding>>,
) {
    if events.read().count() == 0 {
        return;
    }

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    let Some(model) = workbench.scene().model() else {
        return;
    };
    for (id, node) in model.ids().zip(model.nodes()) {
        let Some(material) = handles.get(node.material) else {
            continue;
        };
        commands.spawn((
            Mesh3d(meshes.add(build_mesh(node))),
            MeshMaterial3d(material.clone()),
            Transform::IDENTITY,
            MeshBinding { node: id },
        ));
    }
    tracing::info!("Spawned {} meshes", model.len());
}

fn track_viewport(windows: Query<&Window>, mut workbench: ResMut<Workbench>) {
    let Ok(window) = windows.single() else {
        return;
    };
    let (width, height) = (window.width(), window.height());
    let viewport = workbench.scene().viewport();
    if (viewport.width - width).abs() > 0.5 || (viewport.height - height).abs() > 0.5 {
        workbench.scene_mut().resize(width, height);
    }
}

/// Clicks select in the editor; drags orbit; the wheel zooms
fn handle_pointer(
    windows: Query<&Window>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
    mut workbench: ResMut<Workbench>,
) {
    let egui_wants_pointer = contexts
        .ctx_mut()
        .is_ok_and(|ctx| ctx.wants_pointer_input());

    let total_motion: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let total_scroll: f32 = mouse_wheel.read().map(|w| w.y).sum();
    if egui_wants_pointer {
        return;
    }

    let now = time.elapsed();
    let cursor = windows.single().ok().and_then(|w| w.cursor_position());

    let dragging = match &mut *workbench {
        Workbench::Editor(editor) => {
            if mouse_button.just_pressed(MouseButton::Left) {
                editor.pointer_down(now);
            }
            if mouse_button.just_released(MouseButton::Left) {
                if let Some(pos) = cursor {
                    editor.pointer_up(pos.x, pos.y, now);
                }
            }
            mouse_button.pressed(MouseButton::Left) && editor.is_dragging(now)
        }
        Workbench::Player(_) => mouse_button.pressed(MouseButton::Left),
    };

    if dragging && total_motion != Vec2::ZERO {
        workbench.orbit(
            total_motion.x * ORBIT_SENSITIVITY,
            total_motion.y * ORBIT_SENSITIVITY,
        );
    }
    if total_scroll != 0.0 {
        workbench.zoom((1.0 - total_scroll * ZOOM_SPEED).clamp(0.5, 1.5));
    }
}

fn tick_session(time: Res<Time>, mut workbench: ResMut<Workbench>) {
    workbench.tick(time.delta());
}

/// Copy the headless camera onto the Bevy camera
fn sync_camera(
    workbench: Res<Workbench>,
    mut camera_query: Query<(&mut Transform, &mut Projection), With<MainCamera>>,
) {
    let Ok((mut transform, mut projection)) = camera_query.single_mut() else {
        return;
    };
    let camera = &workbench.scene().camera;
    *transform = Transform::from_translation(to_bevy(camera.position))
        .looking_at(to_bevy(camera.target), to_bevy(camera.up));
    if let Projection::Perspective(perspective) = &mut *projection {
        perspective.fov = camera.fov_y.to_radians();
        perspective.near = camera.near;
        perspective.far = camera.far;
    }
}

fn sync_materials(
    workbench: Res<Workbench>,
    handles: Res<MaterialHandles>,
    mut bound: Query<(&MeshBinding, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    let scene = workbench.scene();
    for (binding, mut material) in bound.iter_mut() {
        let Some(handle) = scene.material(binding.node).and_then(|id| handles.get(id)) else {
            continue;
        };
        if material.0 != *handle {
            material.0 = handle.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_mesh_duplicates_vertices_per_triangle() {
        let node = MeshNode::cuboid("Bolt", glam::Vec3::ZERO, glam::Vec3::splat(0.5));
        let triangles = node.triangles().count();
        let mesh = build_mesh(&node);
        assert_eq!(mesh.count_vertices(), triangles * 3);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(triangles * 3));
    }
}
