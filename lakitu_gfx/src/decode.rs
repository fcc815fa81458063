//! Display list command decoding.
//!
//! [decode_gfx_line] turns one source line into a [GfxCommand]. Symbolic constants from
//! the graphics headers (`G_TX_CLAMP`, `G_IM_FMT_RGBA`, ...) are resolved here, so the
//! interpreter only deals with typed values.

#![allow(missing_docs)]

use lakitu_source::{parse_macro_call, Arg, MacroCall, SourceError};

use crate::cmd::*;

/// Decodes a single display list line.
///
/// Returns `Ok(None)` for lines that are not macro calls.
pub fn decode_gfx_line(line: &str) -> Result<Option<GfxCommand>, SourceError> {
    match parse_macro_call(line)? {
        Some(call) => decode_gfx_command(&call).map(Some),
        None => Ok(None),
    }
}

/// Decodes a parsed macro call.
pub fn decode_gfx_command(call: &MacroCall) -> Result<GfxCommand, SourceError> {
    use GfxCommand::*;

    Ok(match call.name.as_str() {
        "gsSPDisplayList" => {
            call.expect_arity(1)?;
            SPDisplayList(reference_name(call.symbol(0)?).to_owned())
        }
        "gsSPBranchList" => {
            call.expect_arity(1)?;
            SPBranchList(reference_name(call.symbol(0)?).to_owned())
        }
        "gsSPEndDisplayList" => SPEndDisplayList,
        "gsSPSetGeometryMode" => {
            call.expect_arity(1)?;
            SPSetGeometryMode(call.arg(0)?.flags())
        }
        "gsSPClearGeometryMode" => {
            call.expect_arity(1)?;
            SPClearGeometryMode(call.arg(0)?.flags())
        }
        "gsSPTexture" => {
            call.expect_arity(5)?;
            SPTexture {
                scale: TextureScale {
                    s: constant_u32(call, 0)?,
                    t: constant_u32(call, 1)?,
                    level: constant_u32(call, 2)?,
                    tile: constant_u32(call, 3)?,
                },
                on: call.arg(4)?.as_bool(),
            }
        }
        "gsSPSetLights1" => {
            call.expect_arity(1)?;
            SPSetLights1(call.symbol(0)?.to_owned())
        }
        "gsSPLight" => {
            call.expect_arity(2)?;
            let (light, part) = light_reference(call.symbol(0)?)?;
            SPLight {
                light,
                part,
                slot: constant_u32(call, 1)?,
            }
        }
        "gsSPVertex" => {
            call.expect_arity(3)?;
            let (buffer, offset) = vertex_reference(call.arg(0)?)?;
            SPVertex {
                buffer,
                offset,
                count: constant_u32(call, 1)?,
                start: constant_u32(call, 2)?,
            }
        }
        "gsSP1Triangle" => {
            call.expect_arity(4)?;
            SP1Triangle(triangle(call, 0)?)
        }
        "gsSP2Triangles" => {
            call.expect_arity(8)?;
            SP2Triangles(triangle(call, 0)?, triangle(call, 4)?)
        }
        "gsDPSetCombineMode" => {
            call.expect_arity_range(1, 2)?;
            let first = call.arg(0)?.to_string();
            DPSetCombineMode(match call.args.get(1) {
                Some(second) => CombineMode::two_cycle(first, second.to_string()),
                None => CombineMode::one_cycle(first),
            })
        }
        "gsDPSetTile" => {
            call.expect_arity(12)?;
            DPSetTile(TileParams {
                fmt: image_format(call, 0)?,
                size: component_size(call, 1)?,
                line: constant_u32(call, 2)?,
                tmem: constant_u32(call, 3)?,
                tile: constant_u32(call, 4)?,
                palette: constant_u32(call, 5)?,
                cmt: wrap_mode(call, 6)?,
                maskt: constant_u32(call, 7)?,
                shiftt: constant_u32(call, 8)?,
                cms: wrap_mode(call, 9)?,
                masks: constant_u32(call, 10)?,
                shifts: constant_u32(call, 11)?,
            })
        }
        "gsDPSetTextureImage" => {
            call.expect_arity(4)?;
            DPSetTextureImage {
                fmt: image_format(call, 0)?,
                size: component_size(call, 1)?,
                width: constant_u32(call, 2)?,
                texture: texture_name(call.arg(3)?),
            }
        }
        "gsDPLoadTextureBlock" => {
            call.expect_arity(12)?;
            load_texture_block(call, Some(component_size(call, 2)?))?
        }
        "gsDPLoadTextureBlock_4b" => {
            call.expect_arity(11)?;
            load_texture_block(call, None)?
        }
        "gsDPSetEnvColor" => {
            call.expect_arity(4)?;
            DPSetEnvColor(Rgba32 {
                r: constant_u8(call, 0)?,
                g: constant_u8(call, 1)?,
                b: constant_u8(call, 2)?,
                a: constant_u8(call, 3)?,
            })
        }
        "gsSPNoOp" | "gsDPNoOp" | "gsDPPipeSync" | "gsDPLoadSync" | "gsDPTileSync"
        | "gsDPFullSync" => NoOp,
        _ => Unknown(call.clone()),
    })
}

/// `gsDPLoadTextureBlock(timg, fmt, siz, width, height, pal, cms, cmt, masks, maskt, shifts,
/// shiftt)`, or the `_4b` variant without `siz`.
fn load_texture_block(
    call: &MacroCall,
    size: Option<ComponentSize>,
) -> Result<GfxCommand, SourceError> {
    let base = if size.is_some() { 3 } else { 2 };
    let width = constant_u32(call, base)?;
    Ok(GfxCommand::DPLoadTextureBlock {
        texture: texture_name(call.arg(0)?),
        width,
        height: constant_u32(call, base + 1)?,
        params: TileParams {
            fmt: image_format(call, 1)?,
            size: size.unwrap_or(ComponentSize::Bits4),
            line: width,
            tmem: 0,
            tile: 0,
            palette: constant_u32(call, base + 2)?,
            cmt: wrap_mode(call, base + 4)?,
            maskt: constant_u32(call, base + 6)?,
            shiftt: constant_u32(call, base + 8)?,
            cms: wrap_mode(call, base + 3)?,
            masks: constant_u32(call, base + 5)?,
            shifts: constant_u32(call, base + 7)?,
        },
    })
}

/// Resolves a numeric argument, including `|`-combined header constants.
pub fn constant(arg: &Arg) -> Option<i64> {
    match arg {
        Arg::Int(value) => Some(*value),
        Arg::Float(_) => None,
        Arg::Symbol(_) => arg.flags().iter().try_fold(0, |acc, flag| {
            let value = match Arg::parse(flag) {
                Arg::Int(value) => value,
                _ => symbol_value(flag)?,
            };
            Some(acc | value)
        }),
    }
}

fn symbol_value(symbol: &str) -> Option<i64> {
    Some(match symbol {
        "G_TX_NOMIRROR" | "G_TX_WRAP" | "G_TX_NOMASK" | "G_TX_NOLOD" | "G_TX_RENDERTILE" => 0,
        "G_TX_MIRROR" => 1,
        "G_TX_CLAMP" => 2,
        "G_TX_LOADTILE" => 7,
        "G_OFF" | "FALSE" => 0,
        "G_ON" | "TRUE" => 1,
        "G_IM_FMT_RGBA" => ImageFormat::Rgba as i64,
        "G_IM_FMT_YUV" => ImageFormat::Yuv as i64,
        "G_IM_FMT_CI" => ImageFormat::Ci as i64,
        "G_IM_FMT_IA" => ImageFormat::Ia as i64,
        "G_IM_FMT_I" => ImageFormat::I as i64,
        "G_IM_SIZ_4b" => ComponentSize::Bits4 as i64,
        "G_IM_SIZ_8b" => ComponentSize::Bits8 as i64,
        "G_IM_SIZ_16b" => ComponentSize::Bits16 as i64,
        "G_IM_SIZ_32b" => ComponentSize::Bits32 as i64,
        _ => return None,
    })
}

fn constant_u32(call: &MacroCall, i: usize) -> Result<u32, SourceError> {
    let arg = call.arg(i)?;
    constant(arg)
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| bad_arg(call, i, "an unsigned constant"))
}

fn constant_u8(call: &MacroCall, i: usize) -> Result<u8, SourceError> {
    let arg = call.arg(i)?;
    constant(arg)
        .and_then(|value| u8::try_from(value).ok())
        .ok_or_else(|| bad_arg(call, i, "a byte"))
}

fn image_format(call: &MacroCall, i: usize) -> Result<ImageFormat, SourceError> {
    let arg = call.arg(i)?;
    constant(arg)
        .and_then(|value| u8::try_from(value).ok())
        .and_then(|value| ImageFormat::try_from(value).ok())
        .ok_or_else(|| bad_arg(call, i, "an image format"))
}

fn component_size(call: &MacroCall, i: usize) -> Result<ComponentSize, SourceError> {
    let arg = call.arg(i)?;
    constant(arg)
        .and_then(|value| u8::try_from(value).ok())
        .and_then(|value| ComponentSize::try_from(value).ok())
        .ok_or_else(|| bad_arg(call, i, "a component size"))
}

fn wrap_mode(call: &MacroCall, i: usize) -> Result<TileWrapMode, SourceError> {
    let arg = call.arg(i)?;
    constant(arg)
        .and_then(|value| u8::try_from(value).ok())
        .map(TileWrapMode::from)
        .ok_or_else(|| bad_arg(call, i, "a wrap mode"))
}

fn triangle(call: &MacroCall, first: usize) -> Result<[u32; 3], SourceError> {
    Ok([
        constant_u32(call, first)?,
        constant_u32(call, first + 1)?,
        constant_u32(call, first + 2)?,
    ])
}

fn bad_arg(call: &MacroCall, i: usize, expected: &str) -> SourceError {
    SourceError::ParseError {
        message: format!(
            "{} argument {} should be {}, found `{}`",
            call.name,
            i + 1,
            expected,
            call.args[i]
        ),
    }
}

/// Strips a leading `&` and a `[0]` suffix.
fn reference_name(name: &str) -> &str {
    let name = name.trim_start_matches('&').trim();
    name.strip_suffix("[0]").unwrap_or(name).trim_end()
}

/// Texture names sometimes carry a byte offset (`texture + 0x800`), which is dropped.
fn texture_name(arg: &Arg) -> String {
    let text = arg.to_string();
    let name = text.split('+').next().unwrap_or(&text);
    reference_name(name).to_owned()
}

/// Parses `name`, `name + k`, or `&name[k]`.
fn vertex_reference(arg: &Arg) -> Result<(String, u32), SourceError> {
    let text = arg.as_symbol().ok_or_else(|| SourceError::ParseError {
        message: format!("invalid vertex buffer reference `{}`", arg),
    })?;
    let invalid = || SourceError::ParseError {
        message: format!("invalid vertex buffer reference `{}`", text),
    };

    let (name, offset) = if let Some((name, offset)) = text.split_once('+') {
        (name, Arg::parse(offset))
    } else if let Some((name, rest)) = text.split_once('[') {
        let offset = rest.strip_suffix(']').ok_or_else(invalid)?;
        (name, Arg::parse(offset))
    } else {
        (text, Arg::Int(0))
    };
    let offset = offset
        .as_int()
        .and_then(|offset| u32::try_from(offset).ok())
        .ok_or_else(invalid)?;
    let name = name.trim().trim_start_matches('&').trim();
    if name.is_empty() {
        return Err(invalid());
    }
    Ok((name.to_owned(), offset))
}

/// Parses `&name.a`, `&name.l`, or `&name.l[k]`.
fn light_reference(text: &str) -> Result<(String, LightPart), SourceError> {
    let invalid = || SourceError::ParseError {
        message: format!("invalid light reference `{}`", text),
    };
    let text = text.trim_start_matches('&').trim();
    let (name, field) = text.split_once('.').ok_or_else(invalid)?;
    let part = match field.trim() {
        "a" => LightPart::Ambient,
        "l" => LightPart::Directional(0),
        field => {
            let index = field
                .strip_prefix("l[")
                .and_then(|rest| rest.strip_suffix(']'))
                .and_then(|index| Arg::parse(index).as_int())
                .and_then(|index| usize::try_from(index).ok())
                .ok_or_else(invalid)?;
            LightPart::Directional(index)
        }
    };
    Ok((name.trim().to_owned(), part))
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode(line: &str) -> GfxCommand {
        decode_gfx_line(line).unwrap().unwrap()
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            decode("gsSPDisplayList(bob_seg7_dl_0700),"),
            GfxCommand::SPDisplayList("bob_seg7_dl_0700".into())
        );
        assert_eq!(
            decode("gsSPBranchList(bob_dl_b),"),
            GfxCommand::SPBranchList("bob_dl_b".into())
        );
        assert_eq!(decode("gsSPEndDisplayList(),"), GfxCommand::SPEndDisplayList);
        assert_eq!(decode("gsDPPipeSync(),"), GfxCommand::NoOp);
        assert!(matches!(
            decode("gsSPNumLights(NUMLIGHTS_1),"),
            GfxCommand::Unknown(_)
        ));
        assert_eq!(decode_gfx_line("};").unwrap(), None);
    }

    #[test]
    fn test_state_commands() {
        assert_eq!(
            decode("gsSPClearGeometryMode(G_LIGHTING | G_CULL_BACK),"),
            GfxCommand::SPClearGeometryMode(vec!["G_LIGHTING".into(), "G_CULL_BACK".into()])
        );
        assert_eq!(
            decode("gsDPSetCombineMode(G_CC_MODULATERGB, G_CC_MODULATERGB),"),
            GfxCommand::DPSetCombineMode(CombineMode::two_cycle(
                "G_CC_MODULATERGB",
                "G_CC_MODULATERGB"
            ))
        );
        assert_eq!(
            decode("gsSPTexture(0xFFFF, 0xFFFF, 0, G_TX_RENDERTILE, G_ON),"),
            GfxCommand::SPTexture {
                scale: TextureScale {
                    s: 0xFFFF,
                    t: 0xFFFF,
                    level: 0,
                    tile: 0
                },
                on: Some(true)
            }
        );
        assert_eq!(
            decode("gsDPSetEnvColor(255, 255, 255, 150),"),
            GfxCommand::DPSetEnvColor(Rgba32 {
                r: 255,
                g: 255,
                b: 255,
                a: 150
            })
        );
    }

    #[test]
    fn test_set_tile() {
        let cmd = decode(
            "gsDPSetTile(G_IM_FMT_RGBA, G_IM_SIZ_16b, 8, 0, G_TX_RENDERTILE, 0, \
             G_TX_CLAMP, 5, G_TX_NOLOD, G_TX_WRAP | G_TX_MIRROR, 5, G_TX_NOLOD),",
        );
        match cmd {
            GfxCommand::DPSetTile(params) => {
                assert_eq!(params.fmt, ImageFormat::Rgba);
                assert_eq!(params.size, ComponentSize::Bits16);
                assert_eq!(params.line, 8);
                assert_eq!(params.cmt, TileWrapMode::CLAMP);
                assert_eq!(params.cms, TileWrapMode::MIRROR);
                assert_eq!(params.masks, 5);
            }
            _ => panic!("{:?}", cmd),
        }
        assert!(decode_gfx_line("gsDPSetTile(G_IM_FMT_RGBA, 1, 2),").is_err());
        assert!(decode_gfx_line(
            "gsDPSetTile(G_IM_FMT_WAT, G_IM_SIZ_16b, 8, 0, 0, 0, 0, 5, 0, 0, 5, 0),"
        )
        .is_err());
    }

    #[test]
    fn test_load_texture_block() {
        let cmd = decode(
            "gsDPLoadTextureBlock(bob_texture_0800 + 0x800, G_IM_FMT_IA, G_IM_SIZ_8b, 32, 64, 0, \
             G_TX_CLAMP, G_TX_WRAP | G_TX_NOMIRROR, 5, 6, G_TX_NOLOD, G_TX_NOLOD),",
        );
        match cmd {
            GfxCommand::DPLoadTextureBlock {
                texture,
                width,
                height,
                params,
            } => {
                assert_eq!(texture, "bob_texture_0800");
                assert_eq!((width, height), (32, 64));
                assert_eq!(params.fmt, ImageFormat::Ia);
                assert_eq!(params.size, ComponentSize::Bits8);
                assert_eq!(params.cms, TileWrapMode::CLAMP);
                assert_eq!(params.cmt, TileWrapMode::WRAP);
                assert_eq!((params.masks, params.maskt), (5, 6));
                assert_eq!(params.line, 32);
            }
            _ => panic!("{:?}", cmd),
        }

        let cmd = decode(
            "gsDPLoadTextureBlock_4b(shadow_tex, G_IM_FMT_I, 16, 16, 0, G_TX_CLAMP, G_TX_CLAMP, \
             4, 4, G_TX_NOLOD, G_TX_NOLOD),",
        );
        match cmd {
            GfxCommand::DPLoadTextureBlock { params, .. } => {
                assert_eq!(params.size, ComponentSize::Bits4);
                assert_eq!(params.fmt, ImageFormat::I);
            }
            _ => panic!("{:?}", cmd),
        }
    }

    #[test]
    fn test_vertex_references() {
        assert_eq!(
            decode("gsSPVertex(bob_vertex_0, 15, 0),"),
            GfxCommand::SPVertex {
                buffer: "bob_vertex_0".into(),
                offset: 0,
                count: 15,
                start: 0
            }
        );
        assert_eq!(
            decode("gsSPVertex(bob_vertex_0 + 15, 8, 2),"),
            GfxCommand::SPVertex {
                buffer: "bob_vertex_0".into(),
                offset: 15,
                count: 8,
                start: 2
            }
        );
        assert_eq!(
            decode("gsSPVertex(&bob_vertex_0[0x10], 4, 0),"),
            GfxCommand::SPVertex {
                buffer: "bob_vertex_0".into(),
                offset: 16,
                count: 4,
                start: 0
            }
        );
        assert!(decode_gfx_line("gsSPVertex(bob_vertex_0 + x, 4, 0),").is_err());
    }

    #[test]
    fn test_light_references() {
        assert_eq!(
            decode("gsSPLight(&bob_lights.l, 1),"),
            GfxCommand::SPLight {
                light: "bob_lights".into(),
                part: LightPart::Directional(0),
                slot: 1
            }
        );
        assert_eq!(
            decode("gsSPLight(&bob_lights.l[0], 1),"),
            GfxCommand::SPLight {
                light: "bob_lights".into(),
                part: LightPart::Directional(0),
                slot: 1
            }
        );
        assert_eq!(
            decode("gsSPLight(&bob_lights.a, 2),"),
            GfxCommand::SPLight {
                light: "bob_lights".into(),
                part: LightPart::Ambient,
                slot: 2
            }
        );
        assert_eq!(
            decode("gsSPSetLights1(bob_lights),"),
            GfxCommand::SPSetLights1("bob_lights".into())
        );
        assert!(decode_gfx_line("gsSPLight(bob_lights, 1),").is_err());
    }

    #[test]
    fn test_triangles() {
        assert_eq!(
            decode("gsSP2Triangles( 0,  1,  2, 0x0,  0,  2,  3, 0x0),"),
            GfxCommand::SP2Triangles([0, 1, 2], [0, 2, 3])
        );
        assert_eq!(
            decode("gsSP1Triangle( 4,  5,  6, 0x0),"),
            GfxCommand::SP1Triangle([4, 5, 6])
        );
        assert!(decode_gfx_line("gsSP1Triangle(4, 5, 0x0),").is_err());
        assert!(decode_gfx_line("gsSP1Triangle(-1, 5, 6, 0x0),").is_err());
    }
}
