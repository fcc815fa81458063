//! A geo layout interpreter that flattens a scene graph into a list of [Placement]s.
//!
//! The scene graph is never materialized. Instead the interpreter keeps a stack of
//! [TransformNode]s mirroring `GEO_OPEN_NODE`/`GEO_CLOSE_NODE` nesting, and emits a
//! placement whenever a display list is attached at the current node.

use std::collections::HashSet;

use derivative::Derivative;
use lakitu_gfx::util::Matrixf;
use lakitu_source::{MissingReferencePolicy, Namespace, SourceError, SourceStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    animation::{AnimationData, AnimationEvaluator},
    cmd::{DrawLayer, GeoCommand},
    decode::decode_geo_line,
    node::{NodeFlags, Placement, RenderRange, TransformNode},
    GeoError,
};

/// Knobs that control layout flattening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoOptions {
    /// The display list or layout name that means "nothing".
    pub null_sentinel: String,
    /// Switch selectors that are ignored, so that every case is emitted.
    pub inert_switch_selectors: HashSet<String>,
    /// Root layouts whose `GEO_CLOSE_NODE` restores the node one level up from the
    /// popped one.
    pub asymmetric_close_layouts: HashSet<String>,
    /// Maximum nesting of `GEO_BRANCH` calls.
    pub max_branch_depth: usize,
    /// The animation frame that joints are evaluated at.
    pub animation_frame: i32,
    /// What to do when a branch target is missing.
    pub missing_reference_policy: MissingReferencePolicy,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            null_sentinel: "NULL".to_owned(),
            inert_switch_selectors: ["geo_switch_area"].iter().map(|&s| s.to_owned()).collect(),
            asymmetric_close_layouts: ["bowser_geo"].iter().map(|&s| s.to_owned()).collect(),
            max_branch_depth: 64,
            animation_frame: 0,
            missing_reference_policy: MissingReferencePolicy::Skip,
        }
    }
}

/// Flattens the layout `root` into placements in traversal order.
///
/// If `animation` is given, animated parts are posed at [GeoOptions::animation_frame].
/// Otherwise each animated part is a plain translation.
pub fn interpret_geo_layout<S: SourceStore + ?Sized>(
    root: &str,
    sources: &S,
    animation: Option<&AnimationData>,
    options: &GeoOptions,
) -> Result<Vec<Placement>, GeoError> {
    let lines = lookup(sources, root)?;
    let mut interpreter = Interpreter {
        sources,
        options,
        asymmetric_close: options.asymmetric_close_layouts.contains(root),
        animation: animation.map(|data| AnimationEvaluator::new(data, options.animation_frame)),
        joint: 0,
        path: Vec::new(),
        placements: Vec::new(),
    };
    interpreter.interpret(root, lines, TransformNode::root())?;
    debug!(
        "interpreted geo layout {}: {} placements, {} joints",
        root,
        interpreter.placements.len(),
        interpreter.joint
    );
    Ok(interpreter.placements)
}

fn lookup<'a, S: SourceStore + ?Sized>(
    sources: &'a S,
    name: &str,
) -> Result<&'a [String], GeoError> {
    sources
        .lookup(Namespace::Geo, name)
        .map_err(|error| match error {
            SourceError::NotFound { name, .. } => GeoError::MissingLayout { name },
            error => GeoError::decode(name, 0, error),
        })
}

/// Tracks which case of the active `GEO_SWITCH_CASE` is next.
///
/// Only the first case is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SwitchState {
    expected: u32,
    seen: u32,
}

impl SwitchState {
    fn is_open(&self) -> bool {
        self.expected == 0 || self.seen == 0
    }

    fn active(&self) -> bool {
        self.expected > 0
    }

    fn advance(&mut self) {
        if self.expected > 0 {
            self.seen += 1;
            if self.seen >= self.expected {
                *self = SwitchState::default();
            }
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
struct Interpreter<'a, S: SourceStore + ?Sized> {
    #[derivative(Debug = "ignore")]
    sources: &'a S,
    options: &'a GeoOptions,
    asymmetric_close: bool,

    animation: Option<AnimationEvaluator<'a>>,
    /// Index of the next animated part, shared across branches.
    joint: usize,
    /// Layouts currently being interpreted, outermost first.
    path: Vec<String>,
    placements: Vec<Placement>,
}

impl<'a, S: SourceStore + ?Sized> Interpreter<'a, S> {
    fn is_null(&self, name: &str) -> bool {
        name == self.options.null_sentinel
    }

    fn interpret(
        &mut self,
        name: &str,
        lines: &[String],
        parent: TransformNode,
    ) -> Result<(), GeoError> {
        if self.path.iter().any(|entered| entered == name) {
            return Err(GeoError::BranchCycle {
                name: name.to_owned(),
            });
        }
        if self.path.len() >= self.options.max_branch_depth {
            return Err(GeoError::DepthExceeded {
                name: name.to_owned(),
            });
        }
        self.path.push(name.to_owned());

        let mut stack = vec![parent.clone()];
        let mut node = parent;
        let mut switch = SwitchState::default();

        for (line_no, line) in lines.iter().enumerate() {
            let cmd = decode_geo_line(line).map_err(|e| GeoError::decode(name, line_no, e))?;
            let cmd = match cmd {
                Some(cmd) => cmd,
                None => continue,
            };
            trace!("{}: {:?}", name, cmd);

            let counts_as_case = cmd.is_switch_case();
            let open = switch.is_open();
            if counts_as_case && !open {
                trace!("skipping switch case {}", switch.seen);
                switch.advance();
                continue;
            }

            match cmd {
                GeoCommand::Inert(_) => {}
                GeoCommand::OpenNode => {
                    stack.push(node.clone());
                }
                GeoCommand::CloseNode => self.close_node(&mut stack, &mut node),
                GeoCommand::ZBuffer(enable) => node.flags.set(NodeFlags::Z_BUFFER, enable),
                GeoCommand::RenderRange { near, .. } => {
                    node.render_range = Some(if near < 0 {
                        RenderRange::Near
                    } else {
                        RenderRange::Far
                    });
                }
                GeoCommand::SwitchCase { count, selector } => {
                    if count > 0 && !self.options.inert_switch_selectors.contains(&selector) {
                        switch = SwitchState {
                            expected: count,
                            seen: 0,
                        };
                    }
                }
                GeoCommand::Branch { layout, .. } => {
                    if !self.is_null(&layout) {
                        let mut child = node.clone();
                        if switch.active() {
                            child.switch_case = Some(switch.seen);
                        }
                        self.branch(&layout, child)?;
                    }
                }
                GeoCommand::Billboard => node.flags.insert(NodeFlags::BILLBOARD),
                GeoCommand::BillboardWithParams {
                    layer,
                    translation,
                    display_list,
                } => {
                    node.flags.insert(NodeFlags::BILLBOARD);
                    node.translate(translation);
                    if let Some(display_list) = display_list {
                        self.emit(&node, layer, &display_list, node.transform.clone());
                    }
                }
                GeoCommand::Scale {
                    layer,
                    scale,
                    display_list,
                } => {
                    node.scale_by(scale as f32 / 65536.0);
                    if let Some(display_list) = display_list {
                        self.emit(&node, layer, &display_list, node.transform.clone());
                    }
                }
                GeoCommand::TranslateRotate {
                    layer,
                    translation,
                    rotation,
                    display_list,
                } => {
                    node.translate_rotate(translation, rotation);
                    if let Some(display_list) = display_list {
                        self.emit(&node, layer, &display_list, node.transform.clone());
                    }
                }
                GeoCommand::TranslateNode {
                    layer,
                    translation,
                    display_list,
                } => {
                    node.translate(translation);
                    if let Some(display_list) = display_list {
                        self.emit(&node, layer, &display_list, node.transform.clone());
                    }
                }
                GeoCommand::RotationNode {
                    layer,
                    rotation,
                    display_list,
                } => {
                    node.rotate(rotation);
                    if let Some(display_list) = display_list {
                        self.emit(&node, layer, &display_list, node.transform.clone());
                    }
                }
                GeoCommand::AnimatedPart {
                    layer,
                    translation,
                    display_list,
                } => {
                    if node.visible() {
                        let joint = self.joint_transform(translation);
                        node.transform = &node.transform * &joint;
                        self.emit(&node, layer, &display_list, node.transform.clone());
                    }
                }
                GeoCommand::DisplayList {
                    layer,
                    display_list,
                } => {
                    self.emit(&node, layer, &display_list, node.draw_transform());
                }
            }

            if counts_as_case {
                switch.advance();
            }
        }

        self.path.pop();
        Ok(())
    }

    fn close_node(&mut self, stack: &mut Vec<TransformNode>, node: &mut TransformNode) {
        if self.asymmetric_close {
            stack.pop();
            if let Some(top) = stack.last() {
                *node = top.clone();
            }
        } else if let Some(top) = stack.pop() {
            *node = top;
        }
    }

    fn branch(&mut self, layout: &str, node: TransformNode) -> Result<(), GeoError> {
        let sources = self.sources;
        match lookup(sources, layout) {
            Ok(lines) => self.interpret(layout, lines, node),
            Err(GeoError::MissingLayout { name })
                if self.options.missing_reference_policy == MissingReferencePolicy::Skip =>
            {
                warn!("skipping undefined geo layout {}", name);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn joint_transform(&mut self, translation: [f32; 3]) -> Matrixf {
        let joint = self.joint;
        self.joint += 1;
        match &mut self.animation {
            Some(animation) => animation.joint_transform(translation, joint),
            None => Matrixf::translate(translation),
        }
    }

    fn emit(
        &mut self,
        node: &TransformNode,
        layer: DrawLayer,
        display_list: &str,
        transform: Matrixf,
    ) {
        if self.is_null(display_list) || !node.visible() {
            return;
        }
        self.placements.push(Placement {
            display_list: display_list.to_owned(),
            layer,
            transform,
            z_buffer: node.z_buffer(),
            billboard: node.billboard(),
        });
    }
}
