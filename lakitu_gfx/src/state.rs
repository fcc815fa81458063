//! The render state that display list commands mutate.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    cmd::{CombineMode, Rgba32, TextureScale, TileParams},
    tables::{DirectionalLight, LightDef},
};

/// The geometry mode flag that enables vertex lighting.
pub const G_LIGHTING: &str = "G_LIGHTING";

/// The contents of a light slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LightSlot {
    Ambient([u8; 3]),
    Directional(DirectionalLight),
}

/// Render attributes that apply to the triangles drawn after them.
///
/// Two states compare equal only if every field is equal. Batches store snapshots by
/// value, so mutating the live state never affects committed batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderState {
    /// Named geometry mode flags. A flag that was never set or cleared is absent.
    pub geometry_mode: BTreeMap<String, bool>,
    pub combine_mode: Option<CombineMode>,
    /// Light slot index to light data.
    pub lights: BTreeMap<u32, LightSlot>,
    /// The bound texture symbol.
    pub texture: Option<String>,
    pub tile: Option<TileParams>,
    pub texture_enable: bool,
    pub texture_scale: Option<TextureScale>,
    pub env_color: Option<Rgba32>,
}

impl Default for RenderState {
    fn default() -> Self {
        let mut geometry_mode = BTreeMap::new();
        geometry_mode.insert(G_LIGHTING.to_owned(), true);
        Self {
            geometry_mode,
            combine_mode: None,
            lights: BTreeMap::new(),
            texture: None,
            tile: None,
            texture_enable: false,
            texture_scale: None,
            env_color: None,
        }
    }
}

impl RenderState {
    /// Returns true if the geometry mode flag is set.
    pub fn flag(&self, name: &str) -> bool {
        self.geometry_mode.get(name).copied().unwrap_or(false)
    }

    /// Returns true if vertex lighting is enabled, meaning vertex color fields hold
    /// normals.
    pub fn lighting(&self) -> bool {
        self.flag(G_LIGHTING)
    }

    /// Returns true if triangles drawn with this state sample a texture.
    pub fn uses_texture(&self) -> bool {
        self.texture_enable && self.texture.is_some()
    }

    pub fn set_geometry_mode(&mut self, flags: &[String]) {
        for flag in flags {
            self.geometry_mode.insert(flag.clone(), true);
        }
    }

    /// Clears the given flags. Clearing lighting also unbinds all lights.
    pub fn clear_geometry_mode(&mut self, flags: &[String]) {
        for flag in flags {
            self.geometry_mode.insert(flag.clone(), false);
        }
        if flags.iter().any(|flag| flag == G_LIGHTING) {
            self.lights.clear();
        }
    }

    /// Binds a `Lights1` struct: slot 1 is its directional light and slot 2 its ambient
    /// light.
    ///
    /// Returns false if the struct has no directional light, in which case nothing is
    /// bound.
    pub fn set_lights1(&mut self, light: &LightDef) -> bool {
        match light.directional.first() {
            Some(directional) => {
                self.lights.insert(1, LightSlot::Directional(*directional));
                self.lights.insert(2, LightSlot::Ambient(light.ambient));
                true
            }
            None => false,
        }
    }

    pub fn set_light(&mut self, slot: u32, light: LightSlot) {
        self.lights.insert(slot, light);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn flags(names: &[&str]) -> Vec<String> {
        names.iter().map(|&name| name.to_owned()).collect()
    }

    fn lights() -> LightDef {
        LightDef {
            ambient: [0x3f, 0x3f, 0x3f],
            directional: vec![DirectionalLight {
                color: [0xff, 0xff, 0xff],
                dir: [0x28, 0x28, 0x28],
            }],
        }
    }

    #[test]
    fn test_default() {
        let state = RenderState::default();
        assert!(state.lighting());
        assert!(!state.uses_texture());
        assert!(!state.flag("G_CULL_BACK"));
    }

    #[test]
    fn test_geometry_mode() {
        let mut state = RenderState::default();
        state.set_geometry_mode(&flags(&["G_CULL_BACK", "G_SHADING_SMOOTH"]));
        assert!(state.flag("G_CULL_BACK"));

        assert!(state.set_lights1(&lights()));
        assert_eq!(state.lights.len(), 2);
        assert_eq!(state.lights[&2], LightSlot::Ambient([0x3f, 0x3f, 0x3f]));

        state.clear_geometry_mode(&flags(&["G_CULL_BACK"]));
        assert_eq!(state.lights.len(), 2);
        state.clear_geometry_mode(&flags(&["G_LIGHTING"]));
        assert!(!state.lighting());
        assert!(state.lights.is_empty());
    }

    #[test]
    fn test_equality() {
        let mut a = RenderState::default();
        let b = a.clone();
        assert_eq!(a, b);

        a.texture_enable = true;
        assert_ne!(a, b);

        let mut c = RenderState::default();
        c.set_geometry_mode(&flags(&["G_LIGHTING"]));
        assert_eq!(c, b);
        c.clear_geometry_mode(&flags(&["G_FOG"]));
        assert_ne!(c, b);
    }
}
