//! Rust types representing display list commands.

#![allow(missing_docs)]

use lakitu_source::MacroCall;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

/// A decoded display list command.
#[derive(Debug, Clone, PartialEq)]
pub enum GfxCommand {
    NoOp,
    /// A recognised macro that has no effect on the compiled output.
    Unknown(MacroCall),

    // SP commands
    SPDisplayList(String),
    SPBranchList(String),
    SPEndDisplayList,
    SPSetGeometryMode(Vec<String>),
    SPClearGeometryMode(Vec<String>),
    SPTexture {
        scale: TextureScale,
        on: Option<bool>,
    },
    SPSetLights1(String),
    SPLight {
        light: String,
        part: LightPart,
        slot: u32,
    },
    SPVertex {
        buffer: String,
        offset: u32,
        count: u32,
        start: u32,
    },
    SP1Triangle([u32; 3]),
    SP2Triangles([u32; 3], [u32; 3]),

    // DP commands
    DPSetCombineMode(CombineMode),
    DPSetTile(TileParams),
    DPSetTextureImage {
        fmt: ImageFormat,
        size: ComponentSize,
        width: u32,
        texture: String,
    },
    DPLoadTextureBlock {
        texture: String,
        width: u32,
        height: u32,
        params: TileParams,
    },
    DPSetEnvColor(Rgba32),
}

impl GfxCommand {
    pub fn is_triangle(&self) -> bool {
        matches!(self, GfxCommand::SP1Triangle(_) | GfxCommand::SP2Triangles(..))
    }
}

/// Which part of a `Lights` struct a `gsSPLight` command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightPart {
    /// `&name.a`
    Ambient,
    /// `&name.l` or `&name.l[index]`
    Directional(usize),
}

/// The one or two cycle color combiner descriptors, kept as their macro names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CombineMode {
    pub first: String,
    pub second: Option<String>,
}

impl CombineMode {
    pub fn one_cycle(mode: impl Into<String>) -> Self {
        Self {
            first: mode.into(),
            second: None,
        }
    }

    pub fn two_cycle(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: Some(second.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba32 {
    pub fn rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_rgb_a([r, g, b]: [u8; 3], a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ImageFormat {
    Rgba = 0,
    Yuv = 1,
    Ci = 2,
    Ia = 3,
    I = 4,
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self::Rgba
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ComponentSize {
    Bits4 = 0,
    Bits8 = 1,
    Bits16 = 2,
    Bits32 = 3,
}

impl Default for ComponentSize {
    fn default() -> Self {
        Self::Bits16
    }
}

impl ComponentSize {
    pub fn num_bits(self) -> u32 {
        match self {
            ComponentSize::Bits4 => 4,
            ComponentSize::Bits8 => 8,
            ComponentSize::Bits16 => 16,
            ComponentSize::Bits32 => 32,
        }
    }
}

/// Tile settings in `gsDPSetTile` argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileParams {
    pub fmt: ImageFormat,
    pub size: ComponentSize,
    pub line: u32,
    pub tmem: u32,
    pub tile: u32,
    pub palette: u32,
    pub cmt: TileWrapMode,
    pub maskt: u32,
    pub shiftt: u32,
    pub cms: TileWrapMode,
    pub masks: u32,
    pub shifts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileWrapMode {
    pub mirror: bool,
    pub clamp: bool,
}

impl From<u8> for TileWrapMode {
    fn from(v: u8) -> Self {
        Self {
            mirror: v & 0x1 != 0,
            clamp: v & 0x2 != 0,
        }
    }
}

impl From<TileWrapMode> for u8 {
    fn from(m: TileWrapMode) -> Self {
        let mut v = 0;
        if m.mirror {
            v |= 0x1;
        }
        if m.clamp {
            v |= 0x2;
        }
        v
    }
}

impl TileWrapMode {
    pub const WRAP: Self = Self {
        mirror: false,
        clamp: false,
    };
    pub const MIRROR: Self = Self {
        mirror: true,
        clamp: false,
    };
    pub const CLAMP: Self = Self {
        mirror: false,
        clamp: true,
    };
}

/// The `gsSPTexture` parameters. Scales are in 0.16 fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextureScale {
    pub s: u32,
    pub t: u32,
    pub level: u32,
    pub tile: u32,
}

impl TextureScale {
    pub fn to_f32(self) -> [f32; 2] {
        [self.s as f32 / 0x10000 as f32, self.t as f32 / 0x10000 as f32]
    }
}
