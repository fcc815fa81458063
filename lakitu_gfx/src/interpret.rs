//! A display list interpreter that produces a list of [GeometryBatch]es, each tagged with
//! the render state that applies to its triangles.
//!
//! The render state is only committed to a batch when triangles are drawn, since state
//! commands may legally appear between a vertex load and the triangles that use it.

use derivative::Derivative;
use lakitu_source::{MissingReferencePolicy, Namespace, SourceError, SourceStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    cmd::*,
    decode::decode_gfx_line,
    state::{LightSlot, RenderState},
    tables::{LightTable, VertexTable},
    util::Vertex,
    GfxError,
};

/// Limits and policies for display list interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GfxOptions {
    /// Maximum nesting of `gsSPDisplayList` calls, and maximum number of
    /// `gsSPBranchList` jumps within one list.
    pub max_branch_depth: usize,
    /// What to do when a referenced light is missing.
    pub missing_reference_policy: MissingReferencePolicy,
}

impl Default for GfxOptions {
    fn default() -> Self {
        Self {
            max_branch_depth: 64,
            missing_reference_policy: MissingReferencePolicy::Skip,
        }
    }
}

/// Vertices and triangles drawn with a single render state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryBatch {
    /// The vertex buffer name.
    pub name: String,
    /// The render state at the time the triangles were drawn.
    pub state: RenderState,
    /// Indices into the vertex arrays, three per triangle.
    pub triangles: Vec<u32>,
    pub positions: Vec<[f32; 3]>,
    /// Texture coordinates in raw S10.5 units.
    pub uvs: Vec<[f32; 2]>,
    /// Vertex color if [RenderState::lighting] is off, otherwise a vertex normal.
    pub cn: Vec<[u8; 4]>,
    /// The vertex cache slot that each vertex was read from.
    pub slots: Vec<u32>,
}

impl GeometryBatch {
    fn new(name: &str, vertices: &[Vertex], start: u32, state: RenderState) -> Self {
        let mut batch = Self {
            name: name.to_owned(),
            state,
            triangles: Vec::new(),
            positions: Vec::with_capacity(vertices.len()),
            uvs: Vec::with_capacity(vertices.len()),
            cn: Vec::with_capacity(vertices.len()),
            slots: Vec::with_capacity(vertices.len()),
        };
        for (slot, vertex) in (start..).zip(vertices) {
            batch.push_vertex(slot, vertex);
        }
        batch
    }

    fn push_vertex(&mut self, slot: u32, v: &Vertex) {
        self.positions
            .push([v.pos[0] as f32, v.pos[1] as f32, v.pos[2] as f32]);
        self.uvs.push([v.uv[0] as f32, v.uv[1] as f32]);
        self.cn.push(v.cn);
        self.slots.push(slot);
    }

    /// A batch with the same vertex data and no triangles.
    fn duplicate(&self, state: RenderState) -> Self {
        Self {
            name: self.name.clone(),
            state,
            triangles: Vec::new(),
            positions: self.positions.clone(),
            uvs: self.uvs.clone(),
            cn: self.cn.clone(),
            slots: self.slots.clone(),
        }
    }

    /// Returns true if [GeometryBatch::cn] holds normals.
    pub fn lit(&self) -> bool {
        self.state.lighting()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Appends a triangle by cache slot. Slots filled by an earlier load are copied into
    /// the batch on first use.
    fn push_triangle(&mut self, vertices: [u32; 3], cache: &VertexCache) -> Result<(), GfxError> {
        for slot in vertices {
            let local = match self.slots.iter().position(|&s| s == slot) {
                Some(local) => local,
                None => {
                    let vertex = cache.get(slot).ok_or(GfxError::InvalidVertexIndex {
                        index: slot,
                        count: cache.loaded(),
                    })?;
                    self.push_vertex(slot, vertex);
                    self.slots.len() - 1
                }
            };
            self.triangles.push(local as u32);
        }
        Ok(())
    }

    fn push_triangles(&mut self, cmd: &GfxCommand, cache: &VertexCache) -> Result<(), GfxError> {
        match cmd {
            GfxCommand::SP1Triangle(t) => self.push_triangle(*t, cache),
            GfxCommand::SP2Triangles(t0, t1) => {
                self.push_triangle(*t0, cache)?;
                self.push_triangle(*t1, cache)
            }
            _ => Ok(()),
        }
    }
}

/// Number of vertex slots that `gsSPVertex` can load into.
pub const VERTEX_CACHE_SIZE: usize = 32;

/// The vertices currently loaded into each slot.
#[derive(Debug, Clone)]
struct VertexCache {
    slots: Vec<Option<Vertex>>,
}

impl VertexCache {
    fn new() -> Self {
        Self {
            slots: vec![None; VERTEX_CACHE_SIZE],
        }
    }

    fn load(&mut self, start: u32, vertices: &[Vertex]) -> Result<(), GfxError> {
        let begin = start as usize;
        let end = begin + vertices.len();
        let slots = self
            .slots
            .get_mut(begin..end)
            .ok_or(GfxError::InvalidVertexIndex {
                index: end.saturating_sub(1) as u32,
                count: VERTEX_CACHE_SIZE as u32,
            })?;
        for (slot, vertex) in slots.iter_mut().zip(vertices) {
            *slot = Some(*vertex);
        }
        Ok(())
    }

    fn get(&self, slot: u32) -> Option<&Vertex> {
        self.slots.get(slot as usize).and_then(Option::as_ref)
    }

    fn loaded(&self) -> u32 {
        self.slots.iter().filter(|slot| slot.is_some()).count() as u32
    }
}

/// Interprets the display list `name` and returns its geometry in draw order.
///
/// Nested `gsSPDisplayList` calls are expanded in place. A missing display list or
/// vertex buffer is an error; callers that prefer to skip can check
/// [GfxError::is_resolution].
pub fn interpret_display_list<S: SourceStore + ?Sized>(
    name: &str,
    sources: &S,
    vertices: &VertexTable,
    lights: &LightTable,
    options: &GfxOptions,
) -> Result<Vec<GeometryBatch>, GfxError> {
    let mut interpreter = Interpreter {
        sources,
        vertices,
        lights,
        options,
        state: RenderState::default(),
        cache: VertexCache::new(),
        batches: Vec::new(),
        depth: 0,
    };
    interpreter.interpret(name)?;
    debug!(
        "interpreted display list {}: {} batches",
        name,
        interpreter.batches.len()
    );
    Ok(interpreter.batches)
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
struct Interpreter<'a, S: SourceStore + ?Sized> {
    #[derivative(Debug = "ignore")]
    sources: &'a S,
    vertices: &'a VertexTable,
    lights: &'a LightTable,
    options: &'a GfxOptions,

    state: RenderState,
    cache: VertexCache,
    batches: Vec<GeometryBatch>,
    depth: usize,
}

impl<'a, S: SourceStore + ?Sized> Interpreter<'a, S> {
    fn lookup(&self, name: &str) -> Result<&'a [String], GfxError> {
        let sources = self.sources;
        sources
            .lookup(Namespace::Gfx, name)
            .map_err(|error| match error {
                SourceError::NotFound { name, .. } => GfxError::MissingDisplayList { name },
                error => GfxError::decode(name, 0, error),
            })
    }

    fn missing_light(&self, name: &str) -> Result<(), GfxError> {
        match self.options.missing_reference_policy {
            MissingReferencePolicy::Skip => {
                warn!("skipping undefined light {}", name);
                Ok(())
            }
            MissingReferencePolicy::Fail => Err(GfxError::MissingLight {
                name: name.to_owned(),
            }),
        }
    }

    fn load_vertices(
        &mut self,
        buffer: &str,
        offset: u32,
        count: u32,
        start: u32,
    ) -> Result<(), GfxError> {
        let vertices = self
            .vertices
            .get(buffer)
            .ok_or_else(|| GfxError::MissingVertexBuffer {
                name: buffer.to_owned(),
            })?;
        let begin = offset as usize;
        let end = begin + count as usize;
        let loaded = vertices
            .get(begin..end)
            .ok_or(GfxError::InvalidVertexIndex {
                index: end.saturating_sub(1) as u32,
                count: vertices.len() as u32,
            })?;
        self.cache.load(start, loaded)?;
        self.batches.push(GeometryBatch::new(
            buffer,
            loaded,
            start,
            self.state.clone(),
        ));
        Ok(())
    }

    /// Commits triangles to the most recent batch, or a copy of it if the state has
    /// changed since it was drawn with. Returns the index of the last line consumed.
    fn draw_triangles(
        &mut self,
        list: &str,
        lines: &[String],
        pos: usize,
        cmd: &GfxCommand,
    ) -> Result<usize, GfxError> {
        let batch = self
            .batches
            .last_mut()
            .ok_or_else(|| GfxError::TriangleWithoutVertices {
                list: list.to_owned(),
                line: pos,
            })?;

        let cache = &self.cache;
        if batch.state == self.state {
            batch.push_triangles(cmd, cache)?;

            // Consecutive triangle commands cannot change the state.
            let mut pos = pos;
            while let Some(line) = lines.get(pos + 1) {
                match decode_gfx_line(line) {
                    Ok(Some(next)) if next.is_triangle() => {
                        batch.push_triangles(&next, cache)?;
                        pos += 1;
                    }
                    _ => break,
                }
            }
            Ok(pos)
        } else if batch.triangles.is_empty() {
            batch.state = self.state.clone();
            batch.push_triangles(cmd, cache)?;
            Ok(pos)
        } else {
            let mut copy = batch.duplicate(self.state.clone());
            copy.push_triangles(cmd, cache)?;
            self.batches.push(copy);
            Ok(pos)
        }
    }

    fn interpret(&mut self, root: &str) -> Result<(), GfxError> {
        use GfxCommand::*;

        let mut name = root.to_owned();
        let mut lines = self.lookup(&name)?;
        let mut jumps = 0;
        let mut pos = 0;

        while pos < lines.len() {
            let cmd = match decode_gfx_line(&lines[pos])
                .map_err(|error| GfxError::decode(&name, pos, error))?
            {
                Some(cmd) => cmd,
                None => {
                    pos += 1;
                    continue;
                }
            };

            match cmd {
                NoOp => {}
                Unknown(call) => {
                    trace!("ignoring {} in {}", call.name, name);
                }
                SPDisplayList(child) => {
                    if self.depth >= self.options.max_branch_depth {
                        return Err(GfxError::BranchDepthExceeded { name: child });
                    }
                    self.depth += 1;
                    let result = self.interpret(&child);
                    self.depth -= 1;
                    result?;
                }
                SPBranchList(target) => {
                    jumps += 1;
                    if jumps > self.options.max_branch_depth {
                        return Err(GfxError::BranchDepthExceeded { name: target });
                    }
                    lines = self.lookup(&target)?;
                    name = target;
                    pos = 0;
                    continue;
                }
                SPEndDisplayList => return Ok(()),
                SPSetGeometryMode(flags) => self.state.set_geometry_mode(&flags),
                SPClearGeometryMode(flags) => self.state.clear_geometry_mode(&flags),
                SPTexture { scale, on } => {
                    self.state.texture_scale = Some(scale);
                    if let Some(on) = on {
                        self.state.texture_enable = on;
                    }
                }
                SPSetLights1(light) => match self.lights.get(&light) {
                    Some(def) => {
                        if !self.state.set_lights1(def) {
                            warn!("{} has no directional light", light);
                        }
                    }
                    None => self.missing_light(&light)?,
                },
                SPLight { light, part, slot } => match self.lights.get(&light) {
                    Some(def) => {
                        let value = match part {
                            LightPart::Ambient => Some(LightSlot::Ambient(def.ambient)),
                            LightPart::Directional(index) => def
                                .directional
                                .get(index)
                                .map(|&directional| LightSlot::Directional(directional)),
                        };
                        match value {
                            Some(value) => self.state.set_light(slot, value),
                            None => warn!("{} has no light {:?}", light, part),
                        }
                    }
                    None => self.missing_light(&light)?,
                },
                SPVertex {
                    buffer,
                    offset,
                    count,
                    start,
                } => self.load_vertices(&buffer, offset, count, start)?,
                SP1Triangle(_) | SP2Triangles(..) => {
                    pos = self.draw_triangles(&name, lines, pos, &cmd)?;
                }
                DPSetCombineMode(mode) => self.state.combine_mode = Some(mode),
                DPSetTile(params) => self.state.tile = Some(params),
                DPSetTextureImage { texture, .. } => self.state.texture = Some(texture),
                DPLoadTextureBlock {
                    texture, params, ..
                } => {
                    self.state.texture = Some(texture);
                    self.state.tile = Some(params);
                }
                DPSetEnvColor(color) => self.state.env_color = Some(color),
            }
            pos += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use lakitu_source::SourceMap;

    use super::*;
    use crate::tables::{DirectionalLight, LightDef};

    struct Fixture {
        sources: SourceMap,
        vertices: VertexTable,
        lights: LightTable,
        options: GfxOptions,
    }

    impl Fixture {
        fn new() -> Self {
            let mut vertices = VertexTable::new();
            vertices.insert(
                "vtx",
                (0..8)
                    .map(|i| Vertex {
                        pos: [i, 2 * i, 3 * i],
                        flag: 0,
                        uv: [32 * i, 0],
                        cn: [i as u8, 0, 0, 0xff],
                    })
                    .collect(),
            );
            let mut lights = LightTable::new();
            lights.insert(
                "lights",
                LightDef {
                    ambient: [0x3f, 0x3f, 0x3f],
                    directional: vec![DirectionalLight {
                        color: [0xff, 0xff, 0xff],
                        dir: [0x28, 0x28, 0x28],
                    }],
                },
            );
            Self {
                sources: SourceMap::new(),
                vertices,
                lights,
                options: GfxOptions::default(),
            }
        }

        fn list(&mut self, name: &str, lines: &[&str]) -> &mut Self {
            self.sources
                .insert(Namespace::Gfx, name, lines.iter().copied());
            self
        }

        fn run(&self, name: &str) -> Result<Vec<GeometryBatch>, GfxError> {
            interpret_display_list(
                name,
                &self.sources,
                &self.vertices,
                &self.lights,
                &self.options,
            )
        }
    }

    #[test]
    fn test_consecutive_triangles_share_batch() {
        let mut f = Fixture::new();
        f.list(
            "dl",
            &[
                "gsSPVertex(vtx, 4, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsSP2Triangles(0, 2, 3, 0x0, 1, 2, 3, 0x0),",
                "gsSPEndDisplayList(),",
            ],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].triangles, vec![0, 1, 2, 0, 2, 3, 1, 2, 3]);
        assert_eq!(batches[0].vertex_count(), 4);
        assert_eq!(batches[0].positions[3], [3.0, 6.0, 9.0]);
        assert!(batches[0].lit());
    }

    #[test]
    fn test_state_change_before_triangles_is_retroactive() {
        let mut f = Fixture::new();
        f.list(
            "dl",
            &[
                "gsSPVertex(vtx, 4, 0),",
                "gsSPClearGeometryMode(G_LIGHTING),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsSP1Triangle(0, 2, 3, 0x0),",
                "gsSPEndDisplayList(),",
            ],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].triangle_count(), 2);
        assert!(!batches[0].lit());
    }

    #[test]
    fn test_state_change_after_triangles_duplicates_vertices() {
        let mut f = Fixture::new();
        f.list(
            "dl",
            &[
                "gsSPVertex(vtx, 4, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsDPSetEnvColor(255, 255, 255, 128),",
                "gsSP1Triangle(0, 2, 3, 0x0),",
                "gsSPEndDisplayList(),",
            ],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].name, batches[1].name);
        assert_eq!(batches[0].positions, batches[1].positions);
        assert_eq!(batches[0].state.env_color, None);
        assert_eq!(
            batches[1].state.env_color,
            Some(Rgba32::from_rgb_a([255, 255, 255], 128))
        );
        assert_eq!(batches[1].triangles, vec![0, 2, 3]);
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut f = Fixture::new();
        f.list(
            "dl",
            &[
                "gsDPSetCombineMode(G_CC_SHADE, G_CC_SHADE),",
                "gsSPVertex(vtx, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsDPSetCombineMode(G_CC_MODULATERGB, G_CC_MODULATERGB),",
                "gsSPVertex(vtx, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
            ],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(
            batches[0].state.combine_mode,
            Some(CombineMode::two_cycle("G_CC_SHADE", "G_CC_SHADE"))
        );
        assert_eq!(
            batches[1].state.combine_mode.as_ref().map(|m| m.first.as_str()),
            Some("G_CC_MODULATERGB")
        );
    }

    #[test]
    fn test_display_list_recursion_and_end() {
        let mut f = Fixture::new();
        f.list(
            "child",
            &[
                "gsSPVertex(vtx, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsSPEndDisplayList(),",
                "gsSPVertex(vtx, 3, 0),",
            ],
        )
        .list(
            "dl",
            &[
                "gsSPDisplayList(child),",
                "gsSPVertex(vtx + 4, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsSPEndDisplayList(),",
            ],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].positions[0], [0.0, 0.0, 0.0]);
        assert_eq!(batches[1].positions[0], [4.0, 8.0, 12.0]);
    }

    #[test]
    fn test_branch_list_jumps_to_start() {
        let mut f = Fixture::new();
        f.list(
            "target",
            &[
                "gsSPVertex(vtx, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsSPEndDisplayList(),",
            ],
        )
        .list(
            "dl",
            &[
                "gsSPBranchList(target),",
                "gsSPVertex(vtx, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
            ],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].triangle_count(), 1);
    }

    #[test]
    fn test_cycles_are_bounded() {
        let mut f = Fixture::new();
        f.list("a", &["gsSPDisplayList(b),"])
            .list("b", &["gsSPDisplayList(a),"])
            .list("loop", &["gsSPBranchList(loop),"]);
        assert!(matches!(
            f.run("a"),
            Err(GfxError::BranchDepthExceeded { .. })
        ));
        assert!(matches!(
            f.run("loop"),
            Err(GfxError::BranchDepthExceeded { .. })
        ));
    }

    #[test]
    fn test_vertex_slots() {
        let mut f = Fixture::new();
        f.list(
            "dl",
            &["gsSPVertex(vtx + 2, 3, 4),", "gsSP1Triangle(4, 5, 6, 0x0),"],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches[0].slots, vec![4, 5, 6]);
        assert_eq!(batches[0].triangles, vec![0, 1, 2]);
        assert_eq!(batches[0].positions[0], [2.0, 4.0, 6.0]);

        f.list(
            "bad",
            &["gsSPVertex(vtx, 3, 0),", "gsSP1Triangle(0, 1, 3, 0x0),"],
        );
        assert_eq!(
            f.run("bad"),
            Err(GfxError::InvalidVertexIndex { index: 3, count: 3 })
        );

        f.list("overflow", &["gsSPVertex(vtx + 6, 4, 0),"]);
        assert!(matches!(
            f.run("overflow"),
            Err(GfxError::InvalidVertexIndex { .. })
        ));
    }

    #[test]
    fn test_triangles_span_vertex_loads() {
        let mut f = Fixture::new();
        f.list(
            "dl",
            &[
                "gsSPVertex(vtx, 4, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsSPVertex(vtx + 4, 2, 8),",
                "gsSP2Triangles(0, 8, 9, 0x0, 8, 9, 3, 0x0),",
                "gsSPVertex(vtx + 6, 1, 0),",
                "gsSP1Triangle(0, 1, 8, 0x0),",
            ],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches.len(), 3);

        assert_eq!(batches[1].slots, vec![8, 9, 0, 3]);
        assert_eq!(batches[1].triangles, vec![2, 0, 1, 0, 1, 3]);
        assert_eq!(batches[1].positions[2], [0.0, 0.0, 0.0]);
        assert_eq!(batches[1].positions[3], [3.0, 6.0, 9.0]);

        // Slot 0 was overwritten by the last load, slot 1 still holds the first one.
        assert_eq!(batches[2].slots, vec![0, 1, 8]);
        assert_eq!(batches[2].positions[0], [6.0, 12.0, 18.0]);
        assert_eq!(batches[2].positions[1], [1.0, 2.0, 3.0]);
        assert_eq!(batches[2].positions[2], [4.0, 8.0, 12.0]);

        f.list("past_cache", &["gsSPVertex(vtx, 4, 30),"]);
        assert_eq!(
            f.run("past_cache"),
            Err(GfxError::InvalidVertexIndex { index: 33, count: 32 })
        );
    }

    #[test]
    fn test_errors() {
        let mut f = Fixture::new();
        f.list("tri", &["gsDPPipeSync(),", "gsSP1Triangle(0, 1, 2, 0x0),"])
            .list("missing_vtx", &["gsSPVertex(nope, 3, 0),"])
            .list("missing_dl", &["gsSPDisplayList(nope),"])
            .list("malformed", &["gsDPPipeSync(),", "gsSPVertex(vtx, 3),"]);

        assert_eq!(
            f.run("tri"),
            Err(GfxError::TriangleWithoutVertices {
                list: "tri".into(),
                line: 1
            })
        );
        let error = f.run("missing_vtx").unwrap_err();
        assert!(error.is_resolution());
        let error = f.run("missing_dl").unwrap_err();
        assert_eq!(
            error,
            GfxError::MissingDisplayList {
                name: "nope".into()
            }
        );
        assert!(matches!(
            f.run("malformed"),
            Err(GfxError::Decode { line: 1, .. })
        ));
        assert!(matches!(
            f.run("undefined"),
            Err(GfxError::MissingDisplayList { .. })
        ));
    }

    #[test]
    fn test_lights() {
        let mut f = Fixture::new();
        f.list(
            "dl",
            &[
                "gsSPSetLights1(lights),",
                "gsSPLight(&missing.l, 1),",
                "gsSPVertex(vtx, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsSPClearGeometryMode(G_LIGHTING),",
                "gsSPVertex(vtx, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsSPSetGeometryMode(G_LIGHTING),",
                "gsSPLight(&lights.a, 3),",
                "gsSPVertex(vtx, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
            ],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].state.lights.len(), 2);
        assert!(batches[1].state.lights.is_empty());
        assert_eq!(
            batches[2].state.lights.get(&3),
            Some(&LightSlot::Ambient([0x3f, 0x3f, 0x3f]))
        );

        f.options.missing_reference_policy = MissingReferencePolicy::Fail;
        assert_eq!(
            f.run("dl"),
            Err(GfxError::MissingLight {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn test_textures() {
        let mut f = Fixture::new();
        f.list(
            "dl",
            &[
                "gsSPTexture(0xFFFF, 0xFFFF, 0, G_TX_RENDERTILE, G_ON),",
                "gsDPLoadTextureBlock(tex_a, G_IM_FMT_RGBA, G_IM_SIZ_16b, 32, 32, 0, \
                 G_TX_WRAP | G_TX_NOMIRROR, G_TX_CLAMP, 5, 5, G_TX_NOLOD, G_TX_NOLOD),",
                "gsSPVertex(vtx, 3, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsSPTexture(0xFFFF, 0xFFFF, 0, G_TX_RENDERTILE, G_OFF),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
            ],
        );
        let batches = f.run("dl").unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches[0].state.uses_texture());
        assert_eq!(batches[0].state.texture.as_deref(), Some("tex_a"));
        assert_eq!(
            batches[0].state.tile.map(|tile| tile.cmt),
            Some(TileWrapMode::CLAMP)
        );
        assert!(!batches[1].state.uses_texture());
    }

    #[test]
    fn test_idempotent() {
        let mut f = Fixture::new();
        f.list(
            "dl",
            &[
                "gsSPVertex(vtx, 4, 0),",
                "gsSP1Triangle(0, 1, 2, 0x0),",
                "gsDPSetCombineMode(G_CC_DECALRGBA, G_CC_DECALRGBA),",
                "gsSP1Triangle(0, 2, 3, 0x0),",
            ],
        );
        assert_eq!(f.run("dl").unwrap(), f.run("dl").unwrap());
    }
}
