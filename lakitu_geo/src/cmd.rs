//! Rust types representing scene graph layout commands.

#![allow(missing_docs)]

use core::fmt;

use lakitu_source::MacroCall;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// A decoded layout command.
///
/// Commands whose name ends in `_WITH_DL` (or `_AND_DL`) carry a display list and are
/// decoded into the same variant as their plain form with `display_list` set.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoCommand {
    /// A recognised macro with no effect on the flattened output (`GEO_ASM`,
    /// `GEO_SHADOW`, `GEO_NODE_START`, ...).
    Inert(MacroCall),

    OpenNode,
    CloseNode,
    ZBuffer(bool),
    RenderRange {
        near: i32,
        far: i32,
    },
    SwitchCase {
        count: u32,
        selector: String,
    },
    Branch {
        layout: String,
        link: bool,
    },
    Billboard,
    BillboardWithParams {
        layer: DrawLayer,
        translation: [f32; 3],
        display_list: Option<String>,
    },
    Scale {
        layer: DrawLayer,
        /// The scale in 16.16 fixed point.
        scale: i32,
        display_list: Option<String>,
    },
    TranslateRotate {
        layer: DrawLayer,
        translation: [f32; 3],
        /// Degrees.
        rotation: [f32; 3],
        display_list: Option<String>,
    },
    TranslateNode {
        layer: DrawLayer,
        translation: [f32; 3],
        display_list: Option<String>,
    },
    RotationNode {
        layer: DrawLayer,
        /// Degrees.
        rotation: [f32; 3],
        display_list: Option<String>,
    },
    AnimatedPart {
        layer: DrawLayer,
        translation: [f32; 3],
        display_list: String,
    },
    DisplayList {
        layer: DrawLayer,
        display_list: String,
    },
}

impl GeoCommand {
    /// Returns true if the command counts as one case of an enclosing switch.
    pub fn is_switch_case(&self) -> bool {
        match self {
            GeoCommand::AnimatedPart { .. }
            | GeoCommand::DisplayList { .. }
            | GeoCommand::Branch { .. } => true,
            GeoCommand::BillboardWithParams { display_list, .. }
            | GeoCommand::Scale { display_list, .. }
            | GeoCommand::TranslateRotate { display_list, .. }
            | GeoCommand::TranslateNode { display_list, .. }
            | GeoCommand::RotationNode { display_list, .. } => display_list.is_some(),
            _ => false,
        }
    }
}

/// The render pass that a display list is drawn in, in draw order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum DrawLayer {
    Force = 0,
    Opaque = 1,
    OpaqueDecal = 2,
    OpaqueInter = 3,
    Alpha = 4,
    Transparent = 5,
    TransparentDecal = 6,
    TransparentInter = 7,
}

impl DrawLayer {
    pub const ALL: [DrawLayer; 8] = [
        DrawLayer::Force,
        DrawLayer::Opaque,
        DrawLayer::OpaqueDecal,
        DrawLayer::OpaqueInter,
        DrawLayer::Alpha,
        DrawLayer::Transparent,
        DrawLayer::TransparentDecal,
        DrawLayer::TransparentInter,
    ];

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "LAYER_FORCE" => DrawLayer::Force,
            "LAYER_OPAQUE" => DrawLayer::Opaque,
            "LAYER_OPAQUE_DECAL" => DrawLayer::OpaqueDecal,
            "LAYER_OPAQUE_INTER" => DrawLayer::OpaqueInter,
            "LAYER_ALPHA" => DrawLayer::Alpha,
            "LAYER_TRANSPARENT" => DrawLayer::Transparent,
            "LAYER_TRANSPARENT_DECAL" => DrawLayer::TransparentDecal,
            "LAYER_TRANSPARENT_INTER" => DrawLayer::TransparentInter,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            DrawLayer::Force => "LAYER_FORCE",
            DrawLayer::Opaque => "LAYER_OPAQUE",
            DrawLayer::OpaqueDecal => "LAYER_OPAQUE_DECAL",
            DrawLayer::OpaqueInter => "LAYER_OPAQUE_INTER",
            DrawLayer::Alpha => "LAYER_ALPHA",
            DrawLayer::Transparent => "LAYER_TRANSPARENT",
            DrawLayer::TransparentDecal => "LAYER_TRANSPARENT_DECAL",
            DrawLayer::TransparentInter => "LAYER_TRANSPARENT_INTER",
        }
    }
}

impl fmt::Display for DrawLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.symbol())
    }
}
