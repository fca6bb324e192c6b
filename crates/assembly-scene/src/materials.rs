//! Shared material library
//!
//! Materials are immutable and shared by every mesh. A mesh only stores which
//! [`MaterialId`] it currently shows.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialId {
    /// Neutral grey every mesh gets on load
    #[default]
    Default,
    /// Selected in the editor, or the current playback step
    Highlight,
    /// A playback step that was already done
    Completed,
}

impl MaterialId {
    pub const ALL: [MaterialId; 3] = [
        MaterialId::Default,
        MaterialId::Highlight,
        MaterialId::Completed,
    ];
}

/// Surface parameters for one material, colors as 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub name: &'static str,
    pub base_color: u32,
    pub emissive: u32,
    pub metallic: f32,
    pub roughness: f32,
}

impl Material {
    /// Base color as linear-ish 0..1 RGB components (no gamma conversion)
    pub fn base_rgb(&self) -> [f32; 3] {
        hex_to_rgb(self.base_color)
    }

    pub fn emissive_rgb(&self) -> [f32; 3] {
        hex_to_rgb(self.emissive)
    }
}

fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

const DEFAULT: Material = Material {
    name: "default",
    base_color: 0xaaaaaa,
    emissive: 0x000000,
    metallic: 0.0,
    roughness: 0.0,
};

const HIGHLIGHT: Material = Material {
    name: "highlight",
    base_color: 0x00ff83,
    emissive: 0x550000,
    metallic: 0.0,
    roughness: 1.0,
};

const COMPLETED: Material = Material {
    name: "completed",
    base_color: 0x888888,
    emissive: 0x000000,
    metallic: 0.0,
    roughness: 0.0,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialLibrary;

impl MaterialLibrary {
    pub fn get(&self, id: MaterialId) -> &'static Material {
        match id {
            MaterialId::Default => &DEFAULT,
            MaterialId::Highlight => &HIGHLIGHT,
            MaterialId::Completed => &COMPLETED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_colors() {
        let library = MaterialLibrary;
        assert_eq!(library.get(MaterialId::Highlight).base_color, 0x00ff83);
        assert_eq!(library.get(MaterialId::Completed).base_rgb(), [136.0 / 255.0; 3]);
        assert_eq!(library.get(MaterialId::default()).name, "default");
    }
}
