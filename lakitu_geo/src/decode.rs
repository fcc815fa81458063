//! Layout command decoding.

use lakitu_source::{parse_macro_call, Arg, MacroCall, SourceError};

use crate::cmd::{DrawLayer, GeoCommand};

/// Decodes a single layout line.
///
/// Returns `Ok(None)` for lines that are not macro calls.
pub fn decode_geo_line(line: &str) -> Result<Option<GeoCommand>, SourceError> {
    match parse_macro_call(line)? {
        Some(call) => decode_geo_command(&call).map(Some),
        None => Ok(None),
    }
}

/// Decodes a parsed macro call.
pub fn decode_geo_command(call: &MacroCall) -> Result<GeoCommand, SourceError> {
    use GeoCommand::*;

    Ok(match call.name.as_str() {
        "GEO_OPEN_NODE" => OpenNode,
        "GEO_CLOSE_NODE" => CloseNode,
        "GEO_ZBUFFER" => {
            call.expect_arity(1)?;
            ZBuffer(call.bool(0)?)
        }
        "GEO_RENDER_RANGE" => {
            call.expect_arity(2)?;
            RenderRange {
                near: int(call, 0)?,
                far: int(call, 1)?,
            }
        }
        "GEO_SWITCH_CASE" => {
            call.expect_arity(2)?;
            SwitchCase {
                count: u32::try_from(call.int(0)?).map_err(|_| bad_arg(call, 0))?,
                selector: call.arg(1)?.to_string(),
            }
        }
        "GEO_BRANCH" => {
            call.expect_arity(2)?;
            Branch {
                layout: call.symbol(1)?.trim_start_matches('&').to_owned(),
                link: call.int(0)? != 0,
            }
        }
        "GEO_BRANCH_AND_LINK" => {
            call.expect_arity(1)?;
            Branch {
                layout: call.symbol(0)?.trim_start_matches('&').to_owned(),
                link: true,
            }
        }
        "GEO_BILLBOARD" => Billboard,
        "GEO_BILLBOARD_WITH_PARAMS" => {
            call.expect_arity(4)?;
            BillboardWithParams {
                layer: layer(call, 0)?,
                translation: vec3(call, 1)?,
                display_list: None,
            }
        }
        "GEO_BILLBOARD_WITH_PARAMS_AND_DL" => {
            call.expect_arity(5)?;
            BillboardWithParams {
                layer: layer(call, 0)?,
                translation: vec3(call, 1)?,
                display_list: Some(display_list(call, 4)?),
            }
        }
        "GEO_SCALE" => {
            call.expect_arity(2)?;
            Scale {
                layer: layer(call, 0)?,
                scale: int(call, 1)?,
                display_list: None,
            }
        }
        "GEO_SCALE_WITH_DL" => {
            call.expect_arity(3)?;
            Scale {
                layer: layer(call, 0)?,
                scale: int(call, 1)?,
                display_list: Some(display_list(call, 2)?),
            }
        }
        "GEO_TRANSLATE_ROTATE" => {
            call.expect_arity(7)?;
            TranslateRotate {
                layer: layer(call, 0)?,
                translation: vec3(call, 1)?,
                rotation: vec3(call, 4)?,
                display_list: None,
            }
        }
        "GEO_TRANSLATE_ROTATE_WITH_DL" => {
            call.expect_arity(8)?;
            TranslateRotate {
                layer: layer(call, 0)?,
                translation: vec3(call, 1)?,
                rotation: vec3(call, 4)?,
                display_list: Some(display_list(call, 7)?),
            }
        }
        "GEO_TRANSLATE" | "GEO_TRANSLATE_WITH_DL" => {
            let with_dl = call.name.ends_with("_WITH_DL");
            call.expect_arity(if with_dl { 5 } else { 4 })?;
            TranslateRotate {
                layer: layer(call, 0)?,
                translation: vec3(call, 1)?,
                rotation: [0.0; 3],
                display_list: optional_display_list(call, with_dl, 4)?,
            }
        }
        "GEO_ROTATE" | "GEO_ROTATE_WITH_DL" => {
            let with_dl = call.name.ends_with("_WITH_DL");
            call.expect_arity(if with_dl { 5 } else { 4 })?;
            TranslateRotate {
                layer: layer(call, 0)?,
                translation: [0.0; 3],
                rotation: vec3(call, 1)?,
                display_list: optional_display_list(call, with_dl, 4)?,
            }
        }
        "GEO_ROTATE_Y" | "GEO_ROTATE_Y_WITH_DL" => {
            let with_dl = call.name.ends_with("_WITH_DL");
            call.expect_arity(if with_dl { 3 } else { 2 })?;
            TranslateRotate {
                layer: layer(call, 0)?,
                translation: [0.0; 3],
                rotation: [0.0, call.float(1)?, 0.0],
                display_list: optional_display_list(call, with_dl, 2)?,
            }
        }
        "GEO_TRANSLATE_NODE" | "GEO_TRANSLATE_NODE_WITH_DL" => {
            let with_dl = call.name.ends_with("_WITH_DL");
            call.expect_arity(if with_dl { 5 } else { 4 })?;
            TranslateNode {
                layer: layer(call, 0)?,
                translation: vec3(call, 1)?,
                display_list: optional_display_list(call, with_dl, 4)?,
            }
        }
        "GEO_ROTATION_NODE" | "GEO_ROTATION_NODE_WITH_DL" => {
            let with_dl = call.name.ends_with("_WITH_DL");
            call.expect_arity(if with_dl { 5 } else { 4 })?;
            RotationNode {
                layer: layer(call, 0)?,
                rotation: vec3(call, 1)?,
                display_list: optional_display_list(call, with_dl, 4)?,
            }
        }
        "GEO_ANIMATED_PART" => {
            call.expect_arity(5)?;
            AnimatedPart {
                layer: layer(call, 0)?,
                translation: vec3(call, 1)?,
                display_list: display_list(call, 4)?,
            }
        }
        "GEO_DISPLAY_LIST" => {
            call.expect_arity(2)?;
            DisplayList {
                layer: layer(call, 0)?,
                display_list: display_list(call, 1)?,
            }
        }
        _ => Inert(call.clone()),
    })
}

fn bad_arg(call: &MacroCall, i: usize) -> SourceError {
    SourceError::ParseError {
        message: format!(
            "{} argument {} is out of range: `{}`",
            call.name,
            i + 1,
            call.args[i]
        ),
    }
}

fn int(call: &MacroCall, i: usize) -> Result<i32, SourceError> {
    i32::try_from(call.int(i)?).map_err(|_| bad_arg(call, i))
}

fn vec3(call: &MacroCall, first: usize) -> Result<[f32; 3], SourceError> {
    Ok([
        call.float(first)?,
        call.float(first + 1)?,
        call.float(first + 2)?,
    ])
}

fn layer(call: &MacroCall, i: usize) -> Result<DrawLayer, SourceError> {
    let arg = call.arg(i)?;
    let layer = match arg {
        Arg::Int(value) => u8::try_from(*value)
            .ok()
            .and_then(|value| DrawLayer::try_from(value).ok()),
        Arg::Symbol(symbol) => DrawLayer::from_symbol(symbol),
        Arg::Float(_) => None,
    };
    layer.ok_or_else(|| SourceError::ParseError {
        message: format!("{} has an invalid draw layer `{}`", call.name, arg),
    })
}

/// A display list name. The null sentinel is passed through and filtered later.
fn display_list(call: &MacroCall, i: usize) -> Result<String, SourceError> {
    let arg = call.arg(i)?;
    match arg {
        Arg::Symbol(name) => Ok(name.trim_start_matches('&').trim().to_owned()),
        Arg::Int(0) => Ok("NULL".to_owned()),
        _ => Err(SourceError::ParseError {
            message: format!("{} has an invalid display list `{}`", call.name, arg),
        }),
    }
}

fn optional_display_list(
    call: &MacroCall,
    with_dl: bool,
    i: usize,
) -> Result<Option<String>, SourceError> {
    if with_dl {
        display_list(call, i).map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode(line: &str) -> GeoCommand {
        decode_geo_line(line).unwrap().unwrap()
    }

    #[test]
    fn test_structure() {
        assert_eq!(decode("GEO_OPEN_NODE(),"), GeoCommand::OpenNode);
        assert_eq!(decode("GEO_CLOSE_NODE(),"), GeoCommand::CloseNode);
        assert_eq!(decode("GEO_ZBUFFER(1),"), GeoCommand::ZBuffer(true));
        assert_eq!(decode("GEO_ZBUFFER(FALSE),"), GeoCommand::ZBuffer(false));
        assert_eq!(
            decode("GEO_RENDER_RANGE(-2048, 5000),"),
            GeoCommand::RenderRange {
                near: -2048,
                far: 5000
            }
        );
        assert_eq!(
            decode("GEO_SWITCH_CASE(4, geo_switch_anim_state),"),
            GeoCommand::SwitchCase {
                count: 4,
                selector: "geo_switch_anim_state".into()
            }
        );
        assert_eq!(
            decode("GEO_BRANCH(1, bowser_geo_0004B0),"),
            GeoCommand::Branch {
                layout: "bowser_geo_0004B0".into(),
                link: true
            }
        );
        assert_eq!(
            decode("GEO_BRANCH_AND_LINK(castle_geo_001400),"),
            GeoCommand::Branch {
                layout: "castle_geo_001400".into(),
                link: true
            }
        );
        assert!(matches!(
            decode("GEO_SHADOW(SHADOW_CIRCLE_4_VERTS, 0x96, 100),"),
            GeoCommand::Inert(_)
        ));
        assert!(matches!(decode("GEO_END(),"), GeoCommand::Inert(_)));
        assert_eq!(decode_geo_line("const GeoLayout bob_geo[] = {").unwrap(), None);
    }

    #[test]
    fn test_transforms() {
        assert_eq!(
            decode("GEO_SCALE(0x00, 16384),"),
            GeoCommand::Scale {
                layer: DrawLayer::Force,
                scale: 16384,
                display_list: None
            }
        );
        assert_eq!(
            decode("GEO_TRANSLATE_ROTATE_WITH_DL(LAYER_ALPHA, 0, 10, 0, 90, 0, 0, bob_dl),"),
            GeoCommand::TranslateRotate {
                layer: DrawLayer::Alpha,
                translation: [0.0, 10.0, 0.0],
                rotation: [90.0, 0.0, 0.0],
                display_list: Some("bob_dl".into())
            }
        );
        assert_eq!(
            decode("GEO_ROTATE_Y(LAYER_OPAQUE, 45),"),
            GeoCommand::TranslateRotate {
                layer: DrawLayer::Opaque,
                translation: [0.0; 3],
                rotation: [0.0, 45.0, 0.0],
                display_list: None
            }
        );
        assert_eq!(
            decode("GEO_TRANSLATE_NODE_WITH_DL(LAYER_OPAQUE, 0, 100, 0, bob_dl),"),
            GeoCommand::TranslateNode {
                layer: DrawLayer::Opaque,
                translation: [0.0, 100.0, 0.0],
                display_list: Some("bob_dl".into())
            }
        );
        assert_eq!(
            decode("GEO_BILLBOARD_WITH_PARAMS_AND_DL(LAYER_ALPHA, 0, 5, 0, coin_dl),"),
            GeoCommand::BillboardWithParams {
                layer: DrawLayer::Alpha,
                translation: [0.0, 5.0, 0.0],
                display_list: Some("coin_dl".into())
            }
        );
    }

    #[test]
    fn test_display_lists() {
        assert_eq!(
            decode("GEO_DISPLAY_LIST(LAYER_OPAQUE, bob_dl),"),
            GeoCommand::DisplayList {
                layer: DrawLayer::Opaque,
                display_list: "bob_dl".into()
            }
        );
        assert_eq!(
            decode("GEO_ANIMATED_PART(LAYER_OPAQUE, 0, 50, 0, NULL),"),
            GeoCommand::AnimatedPart {
                layer: DrawLayer::Opaque,
                translation: [0.0, 50.0, 0.0],
                display_list: "NULL".into()
            }
        );
        assert!(decode("GEO_DISPLAY_LIST(LAYER_OPAQUE, bob_dl),").is_switch_case());
        assert!(!decode("GEO_TRANSLATE_NODE(LAYER_OPAQUE, 0, 100, 0),").is_switch_case());
    }

    #[test]
    fn test_malformed() {
        assert!(decode_geo_line("GEO_DISPLAY_LIST(LAYER_OPAQUE),").is_err());
        assert!(decode_geo_line("GEO_DISPLAY_LIST(LAYER_SIDEWAYS, bob_dl),").is_err());
        assert!(decode_geo_line("GEO_DISPLAY_LIST(9, bob_dl),").is_err());
        assert!(decode_geo_line("GEO_SCALE(0x00, big),").is_err());
        assert!(decode_geo_line("GEO_SWITCH_CASE(-1, geo_switch_anim_state),").is_err());
    }
}
