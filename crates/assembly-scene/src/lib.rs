//! Assembly Scene - Headless 3D state for the plan editor and the station player
//!
//! Nothing in here renders. The front end reads this state each frame and
//! draws it:
//! - Model loading (glTF/GLB) and scene ownership
//! - Ray picking with reversible highlighting
//! - Orbit camera, framing, and eased focus moves
//! - Screen-space step labels
//! - Editor and playback sessions that compose the above

pub mod camera;
pub mod editor;
pub mod focus;
pub mod geometry;
pub mod labels;
pub mod materials;
pub mod models;
pub mod picker;
pub mod player;
pub mod scene;

pub use camera::OrbitCamera;
pub use editor::{EditorSession, EditorSettings};
pub use focus::CameraFocusAnimator;
pub use geometry::{Aabb, Ray};
pub use labels::{Label, LabelPlacement, LabelProjector};
pub use materials::{Material, MaterialId, MaterialLibrary};
pub use models::{load_glb, ModelLoadError};
pub use picker::{pick, ClickGesture, MeshHit, Picker};
pub use player::{PlaybackSession, PlayerSettings};
pub use scene::{MeshNode, NodeId, SceneManager, SceneModel, Viewport};

// Re-export the math types so front ends stay on the same version
pub use glam;
