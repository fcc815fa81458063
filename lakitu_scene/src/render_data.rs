use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use lakitu_geo::cmd::DrawLayer;
use lakitu_gfx::{
    interpret::GeometryBatch,
    tables::TextureHandle,
    util::{normalize, Matrixf, WrapMode},
};
use serde::Serialize;

/// A vertex in the layout expected by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Zeroable, Pod)]
#[repr(C)]
pub struct DrawVertex {
    pub pos: [f32; 4],
    pub uv: [f32; 2],
    /// RGBA color for unlit batches, or a world space normal with w = 0 for lit ones.
    pub shade: [f32; 4],
}

/// Sampler settings for a textured batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureBinding {
    pub texture: TextureHandle,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    /// The `gsSPTexture` s/t scale.
    pub scale: [f32; 2],
}

/// One display list placed in the world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawItem {
    /// Index of the object in the compiled object list.
    pub object: usize,
    pub display_list: String,
    pub layer: DrawLayer,
    /// Model to world transform.
    pub transform: Matrixf,
    pub z_buffer: bool,
    pub billboard: bool,
    pub batches: Arc<Vec<GeometryBatch>>,
    /// One entry per batch, `None` for untextured batches.
    pub textures: Vec<Option<TextureBinding>>,
}

impl DrawItem {
    pub fn triangle_count(&self) -> usize {
        self.batches.iter().map(GeometryBatch::triangle_count).sum()
    }

    /// The vertices of one batch, transformed to world space.
    pub fn world_vertices(&self, batch: usize) -> Vec<DrawVertex> {
        match self.batches.get(batch) {
            Some(batch) => world_vertices(batch, &self.transform),
            None => Vec::new(),
        }
    }
}

/// Converts an S10.5 texture coordinate to texels, sampling at the texel center.
pub fn s10_5_to_f32(value: f32) -> f32 {
    value / 32.0 + 0.5
}

/// Decodes a packed signed normal component.
fn normal_component(value: u8) -> f32 {
    let value = value as i8 as f32;
    if value < 0.0 {
        value / 128.0
    } else {
        value / 127.0
    }
}

/// Transforms the vertices of a batch.
///
/// Unlit batches take their alpha from the environment color when one is set.
pub fn world_vertices(batch: &GeometryBatch, transform: &Matrixf) -> Vec<DrawVertex> {
    let lit = batch.lit();
    let env_alpha = batch.state.env_color.map(|color| color.a);

    (0..batch.vertex_count())
        .map(|i| {
            let p = transform.transform_point(batch.positions[i]);
            let uv = batch.uvs[i];
            let cn = batch.cn[i];
            let shade = if lit {
                let n = transform.transform_direction([
                    normal_component(cn[0]),
                    normal_component(cn[1]),
                    normal_component(cn[2]),
                ]);
                normalize([n[0], n[1], n[2], 0.0])
            } else {
                let a = env_alpha.unwrap_or(cn[3]);
                [
                    cn[0] as f32 / 255.0,
                    cn[1] as f32 / 255.0,
                    cn[2] as f32 / 255.0,
                    a as f32 / 255.0,
                ]
            };
            DrawVertex {
                pos: [p[0], p[1], p[2], 1.0],
                uv: [s10_5_to_f32(uv[0]), s10_5_to_f32(uv[1])],
                shade,
            }
        })
        .collect()
}

/// Flattened world-space triangles for every item, grouped by draw layer in draw order.
pub fn layer_vertices(items: &[DrawItem]) -> [Vec<DrawVertex>; 8] {
    let mut layers: [Vec<DrawVertex>; 8] = Default::default();
    for item in items {
        let out = &mut layers[u8::from(item.layer) as usize];
        for batch in item.batches.iter() {
            let vertices = world_vertices(batch, &item.transform);
            out.extend(
                batch
                    .triangles
                    .iter()
                    .filter_map(|&index| vertices.get(index as usize).copied()),
            );
        }
    }
    layers
}

#[cfg(test)]
mod test {
    use lakitu_gfx::{cmd::Rgba32, state::RenderState};

    use super::*;

    fn batch(lighting: bool) -> GeometryBatch {
        let mut state = RenderState::default();
        if !lighting {
            state.clear_geometry_mode(&["G_LIGHTING".to_owned()]);
        }
        GeometryBatch {
            name: "vtx".into(),
            state,
            triangles: vec![0, 1, 2],
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            uvs: vec![[0.0, 0.0], [32.0, 0.0], [-16.0, 64.0]],
            cn: vec![[0xff, 0x80, 0x00, 0xff], [0, 0x7f, 0, 0], [0x81, 0, 0, 0]],
            slots: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_s10_5() {
        assert_eq!(s10_5_to_f32(0.0), 0.5);
        assert_eq!(s10_5_to_f32(32.0), 1.5);
        assert_eq!(s10_5_to_f32(-16.0), 0.0);
    }

    #[test]
    fn test_unlit_vertices() {
        let mut batch = batch(false);
        let vertices = world_vertices(&batch, &Matrixf::translate([0.0, 10.0, 0.0]));
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].pos, [1.0, 10.0, 0.0, 1.0]);
        assert_eq!(vertices[1].uv, [1.5, 0.5]);
        assert_eq!(vertices[0].shade, [1.0, 128.0 / 255.0, 0.0, 1.0]);

        batch.state.env_color = Some(Rgba32 {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        });
        let vertices = world_vertices(&batch, &Matrixf::identity());
        assert_eq!(vertices[0].shade[3], 0.0);
    }

    #[test]
    fn test_lit_normals() {
        let batch = batch(true);
        let vertices = world_vertices(&batch, &Matrixf::scale(3.0));
        let n = vertices[1].shade;
        assert!((n[1] - 1.0).abs() < 1e-5);
        assert_eq!(n[3], 0.0);
        let n = vertices[2].shade;
        assert!((n[0] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_layers() {
        let item = DrawItem {
            object: 0,
            display_list: "dl".into(),
            layer: DrawLayer::Alpha,
            transform: Matrixf::identity(),
            z_buffer: true,
            billboard: false,
            batches: Arc::new(vec![batch(false)]),
            textures: vec![None],
        };
        assert_eq!(item.triangle_count(), 1);
        let layers = layer_vertices(&[item]);
        assert_eq!(layers[DrawLayer::Alpha as usize].len(), 3);
        assert!(layers[DrawLayer::Opaque as usize].is_empty());
    }
}
