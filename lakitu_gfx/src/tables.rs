//! Name-keyed data tables that display lists refer to.
//!
//! Tables can be filled directly, deserialized, or decoded from the C initializers that
//! declare them (`Vtx name[] = {...}`, `Lights1 name = gdSPDefLights1(...)`).

use std::collections::HashMap;

use lakitu_source::{preprocess::flatten_initializer, Arg, SourceError};
use serde::{Deserialize, Serialize};

use crate::{util::Vertex, GfxError};

/// Vertex buffers by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexTable {
    buffers: HashMap<String, Vec<Vertex>>,
}

impl VertexTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a vertex buffer.
    pub fn insert(&mut self, name: impl Into<String>, vertices: Vec<Vertex>) {
        self.buffers.insert(name.into(), vertices);
    }

    /// Define a vertex buffer from the body of a `Vtx name[] = { ... };` declaration.
    pub fn insert_initializer(&mut self, name: impl Into<String>, body: &str) -> Result<(), SourceError> {
        let values = flatten_initializer(body)?;
        let vertices = vertices_from_values(&values)?;
        self.insert(name, vertices);
        Ok(())
    }

    /// Look up a vertex buffer.
    pub fn get(&self, name: &str) -> Option<&[Vertex]> {
        self.buffers.get(name).map(Vec::as_slice)
    }

    /// The number of buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns true if the table has no buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

fn vertices_from_values(values: &[Arg]) -> Result<Vec<Vertex>, SourceError> {
    if values.len() % 10 != 0 {
        return Err(SourceError::ParseError {
            message: format!(
                "vertex initializer has {} values, expected a multiple of 10",
                values.len()
            ),
        });
    }
    let ints = int_values(values)?;
    Ok(ints
        .chunks_exact(10)
        .map(|v| Vertex {
            pos: [v[0] as i16, v[1] as i16, v[2] as i16],
            flag: v[3] as u16,
            uv: [v[4] as i16, v[5] as i16],
            cn: [v[6] as u8, v[7] as u8, v[8] as u8, v[9] as u8],
        })
        .collect())
}

fn int_values(values: &[Arg]) -> Result<Vec<i64>, SourceError> {
    values
        .iter()
        .map(|value| {
            value.as_int().ok_or_else(|| SourceError::ParseError {
                message: format!("expected an integer, found `{}`", value),
            })
        })
        .collect()
}

/// A directional light: color and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Light color.
    pub color: [u8; 3],
    /// Direction the light comes from, in signed byte units.
    pub dir: [i8; 3],
}

/// A `Lights` struct: one ambient color and any number of directional lights.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightDef {
    /// Ambient color.
    pub ambient: [u8; 3],
    /// Directional lights in declaration order.
    #[serde(default)]
    pub directional: Vec<DirectionalLight>,
}

impl LightDef {
    /// Decode the flattened values of a light declaration.
    ///
    /// `gdSPDefLightsN` supplies three ambient values followed by six per directional
    /// light. A raw `Lights1` struct initializer supplies twenty values (ambient and
    /// light structs with their color copies and padding).
    pub fn from_values(values: &[Arg]) -> Result<Self, SourceError> {
        let ints = int_values(values)?;
        let rgb = |v: &[i64]| [v[0] as u8, v[1] as u8, v[2] as u8];
        let dir = |v: &[i64]| [v[0] as i8, v[1] as i8, v[2] as i8];

        if ints.len() % 6 == 3 {
            Ok(Self {
                ambient: rgb(&ints[..3]),
                directional: ints[3..]
                    .chunks_exact(6)
                    .map(|l| DirectionalLight {
                        color: rgb(&l[..3]),
                        dir: dir(&l[3..]),
                    })
                    .collect(),
            })
        } else if ints.len() == 20 {
            Ok(Self {
                ambient: rgb(&ints[..3]),
                directional: vec![DirectionalLight {
                    color: rgb(&ints[8..11]),
                    dir: dir(&ints[16..19]),
                }],
            })
        } else {
            Err(SourceError::ParseError {
                message: format!("light declaration has {} values", ints.len()),
            })
        }
    }
}

/// Light declarations by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LightTable {
    lights: HashMap<String, LightDef>,
}

impl LightTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a light.
    pub fn insert(&mut self, name: impl Into<String>, light: LightDef) {
        self.lights.insert(name.into(), light);
    }

    /// Define a light from the initializer of a `Lights1 name = ...;` declaration.
    pub fn insert_initializer(&mut self, name: impl Into<String>, body: &str) -> Result<(), SourceError> {
        let values = flatten_initializer(body)?;
        self.insert(name, LightDef::from_values(&values)?);
        Ok(())
    }

    /// Look up a light.
    pub fn get(&self, name: &str) -> Option<&LightDef> {
        self.lights.get(name)
    }
}

/// A reference to a texture image on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureHandle {
    /// Path of the image file.
    pub path: String,
}

/// Texture images by texture symbol name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureTable {
    textures: HashMap<String, TextureHandle>,
}

impl TextureTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a texture.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.textures
            .insert(name.into(), TextureHandle { path: path.into() });
    }

    /// Look up a texture. A missing texture cannot be substituted, so this is an error.
    pub fn resolve(&self, name: &str) -> Result<&TextureHandle, GfxError> {
        self.textures
            .get(name)
            .ok_or_else(|| GfxError::MissingTexture {
                name: name.to_owned(),
            })
    }
}
