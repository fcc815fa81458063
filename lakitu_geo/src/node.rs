use bitflags::bitflags;
use lakitu_gfx::util::Matrixf;
use serde::Serialize;

use crate::cmd::DrawLayer;

bitflags! {
    /// Render flags that a node passes on to its children.
    #[derive(Default)]
    pub struct NodeFlags: u8 {
        const Z_BUFFER  = 1 << 0;
        const BILLBOARD = 1 << 1;
    }
}

/// Which side of a `GEO_RENDER_RANGE` split a node falls on.
///
/// Only the near model is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RenderRange {
    Near,
    Far,
}

/// The running state of a scene graph node while a layout is being flattened.
///
/// Opening a node pushes a copy of the current node, so children inherit every field.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformNode {
    /// Accumulated local-to-model transform.
    pub transform: Matrixf,
    pub flags: NodeFlags,
    pub render_range: Option<RenderRange>,
    /// Accumulated scale factor, used to undo scaling under billboards.
    pub scale: f32,
    /// The case index within an enclosing switch, for nodes entered through one.
    pub switch_case: Option<u32>,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self {
            transform: Matrixf::identity(),
            flags: NodeFlags::Z_BUFFER,
            render_range: None,
            scale: 1.0,
            switch_case: None,
        }
    }
}

impl TransformNode {
    /// The identity node with z-buffering enabled.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns false if the node lies on the far side of a render range.
    pub fn visible(&self) -> bool {
        self.render_range != Some(RenderRange::Far)
    }

    pub fn z_buffer(&self) -> bool {
        self.flags.contains(NodeFlags::Z_BUFFER)
    }

    pub fn billboard(&self) -> bool {
        self.flags.contains(NodeFlags::BILLBOARD)
    }

    pub fn translate(&mut self, translation: [f32; 3]) {
        self.transform = &self.transform * &Matrixf::translate(translation);
    }

    /// Applies a rotation in the parent's frame, like [TransformNode::translate_rotate].
    pub fn rotate(&mut self, rotation: [f32; 3]) {
        self.transform = &Matrixf::rotate_zxy(rotation) * &self.transform;
    }

    /// Applies a rotation followed by a translation, both in the parent's frame.
    pub fn translate_rotate(&mut self, translation: [f32; 3], rotation: [f32; 3]) {
        let local = &Matrixf::translate(translation) * &Matrixf::rotate_zxy(rotation);
        self.transform = &local * &self.transform;
    }

    pub fn scale_by(&mut self, scale: f32) {
        self.transform = &self.transform * &Matrixf::scale(scale);
        self.scale *= scale;
    }

    /// The transform used for a `GEO_DISPLAY_LIST` drawn at this node.
    ///
    /// Billboarded geometry is drawn at unit scale.
    pub fn draw_transform(&self) -> Matrixf {
        if self.billboard() && self.scale != 0.0 {
            &self.transform * &Matrixf::scale(1.0 / self.scale)
        } else {
            self.transform.clone()
        }
    }
}

/// A display list to draw, with everything needed to place it in model space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub display_list: String,
    pub layer: DrawLayer,
    pub transform: Matrixf,
    pub z_buffer: bool,
    pub billboard: bool,
}
