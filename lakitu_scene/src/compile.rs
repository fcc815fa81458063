//! Compiles placed objects into a renderer-ready draw list.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use lakitu_geo::{animation::AnimationData, interpret::interpret_geo_layout, node::Placement};
use lakitu_gfx::{
    interpret::{interpret_display_list, GeometryBatch},
    tables::{LightTable, TextureTable, VertexTable},
    util::{Matrixf, WrapMode},
    GfxError,
};
use lakitu_source::{MissingReferencePolicy, SourceMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    render_data::{layer_vertices, DrawItem, DrawVertex, TextureBinding},
    SceneConfig, SceneError,
};

/// Everything that objects can refer to by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneAssets {
    pub sources: SourceMap,
    pub vertices: VertexTable,
    pub lights: LightTable,
    pub textures: TextureTable,
    pub animations: HashMap<String, AnimationData>,
    /// Model name to the geometry that draws it.
    pub models: HashMap<String, ObjectModel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectModel {
    pub geo_layout: String,
    #[serde(default)]
    pub animation: Option<String>,
}

/// An instance of a model in the level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPlacement {
    pub model: String,
    #[serde(default)]
    pub position: [f32; 3],
    /// Degrees.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: f32,
    #[serde(default)]
    pub area_offset: [f32; 3],
}

fn unit_scale() -> f32 {
    1.0
}

impl ObjectPlacement {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: 1.0,
            area_offset: [0.0; 3],
        }
    }

    /// The model to world transform: scale, then rotate about y, x, and z, then
    /// translate by the position plus the area offset.
    pub fn transform(&self) -> Matrixf {
        let t = [
            self.position[0] + self.area_offset[0],
            self.position[1] + self.area_offset[1],
            self.position[2] + self.area_offset[2],
        ];
        let r = self.rotation;
        let rotation = &(&Matrixf::rotate_z(r[2]) * &Matrixf::rotate_x(r[0]))
            * &Matrixf::rotate_y(r[1]);
        &(&Matrixf::translate(t) * &rotation) * &Matrixf::scale(self.scale)
    }
}

/// An object that was left out of the compiled scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedObject {
    pub object: usize,
    pub model: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledScene {
    /// Draw items in object order, then placement order.
    pub items: Vec<DrawItem>,
    pub skipped: Vec<SkippedObject>,
}

impl CompiledScene {
    pub fn batch_count(&self) -> usize {
        self.items.iter().map(|item| item.batches.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.items.iter().map(DrawItem::triangle_count).sum()
    }

    /// World space triangle vertices for each draw layer.
    pub fn layer_vertices(&self) -> [Vec<DrawVertex>; 8] {
        layer_vertices(&self.items)
    }
}

/// Compiles objects against a fixed set of assets.
///
/// Display lists are interpreted at most once per compiler when memoization is enabled,
/// so one compiler should be reused for every object in a level.
#[derive(Debug)]
pub struct SceneCompiler<'a> {
    assets: &'a SceneAssets,
    config: &'a SceneConfig,
    display_lists: Mutex<HashMap<String, Arc<Vec<GeometryBatch>>>>,
}

impl<'a> SceneCompiler<'a> {
    pub fn new(assets: &'a SceneAssets, config: &'a SceneConfig) -> Self {
        Self {
            assets,
            config,
            display_lists: Mutex::new(HashMap::new()),
        }
    }

    fn skipping(&self) -> bool {
        self.config.missing_reference_policy == MissingReferencePolicy::Skip
    }

    /// The number of display lists that have been interpreted and cached.
    pub fn cached_display_lists(&self) -> usize {
        self.display_lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Interprets a display list, reusing a cached result if possible.
    pub fn display_list(&self, name: &str) -> Result<Arc<Vec<GeometryBatch>>, GfxError> {
        let interpret = || {
            interpret_display_list(
                name,
                &self.assets.sources,
                &self.assets.vertices,
                &self.assets.lights,
                &self.config.gfx_options(),
            )
            .map(Arc::new)
        };

        if !self.config.memoize_display_lists {
            return interpret();
        }

        let mut display_lists = self
            .display_lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(batches) = display_lists.get(name) {
            return Ok(Arc::clone(batches));
        }
        let batches = interpret()?;
        display_lists.insert(name.to_owned(), Arc::clone(&batches));
        Ok(batches)
    }

    /// Compiles every object. An object that fails to compile is logged and skipped,
    /// along with every draw item it produced, unless the policy is
    /// [MissingReferencePolicy::Fail].
    pub fn compile(&self, objects: &[ObjectPlacement]) -> Result<CompiledScene, SceneError> {
        let mut scene = CompiledScene::default();
        for (index, object) in objects.iter().enumerate() {
            match self.compile_object(index, object) {
                Ok(items) => scene.items.extend(items),
                Err(error) if self.skipping() => {
                    warn!("skipping object {} ({}): {}", index, object.model, error);
                    scene.skipped.push(SkippedObject {
                        object: index,
                        model: object.model.clone(),
                        reason: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
        }
        info!(
            "compiled {} objects: {} draw items, {} batches, {} skipped",
            objects.len(),
            scene.items.len(),
            scene.batch_count(),
            scene.skipped.len()
        );
        Ok(scene)
    }

    /// Compiles one object. `index` is recorded on the resulting draw items.
    pub fn compile_object(
        &self,
        index: usize,
        object: &ObjectPlacement,
    ) -> Result<Vec<DrawItem>, SceneError> {
        let model = self
            .assets
            .models
            .get(&object.model)
            .ok_or_else(|| SceneError::UnknownObjectModel {
                model: object.model.clone(),
            })?;
        let animation = self.animation(model)?;

        let placements = interpret_geo_layout(
            &model.geo_layout,
            &self.assets.sources,
            animation,
            &self.config.geo_options(),
        )?;

        let object_transform = object.transform();
        let mut items = Vec::with_capacity(placements.len());
        for placement in placements {
            if let Some(item) = self.compile_placement(index, &object_transform, placement)? {
                items.push(item);
            }
        }
        debug!("object {} ({}): {} draw items", index, object.model, items.len());
        Ok(items)
    }

    fn animation(&self, model: &ObjectModel) -> Result<Option<&'a AnimationData>, SceneError> {
        let name = match &model.animation {
            Some(name) => name,
            None => return Ok(None),
        };
        let assets: &'a SceneAssets = self.assets;
        match assets.animations.get(name) {
            Some(animation) => Ok(Some(animation)),
            None if self.skipping() => {
                warn!("undefined animation {}, using the bind pose", name);
                Ok(None)
            }
            None => Err(SceneError::MissingAnimation { name: name.clone() }),
        }
    }

    fn compile_placement(
        &self,
        index: usize,
        object_transform: &Matrixf,
        placement: Placement,
    ) -> Result<Option<DrawItem>, SceneError> {
        let batches = match self.display_list(&placement.display_list) {
            Ok(batches) => batches,
            Err(error) if self.skipping() && error.is_resolution() => {
                warn!("skipping display list {}: {}", placement.display_list, error);
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };
        let textures = self.bind_textures(&batches)?;

        Ok(Some(DrawItem {
            object: index,
            display_list: placement.display_list,
            layer: placement.layer,
            transform: object_transform * &placement.transform,
            z_buffer: placement.z_buffer,
            billboard: placement.billboard,
            batches,
            textures,
        }))
    }

    fn bind_textures(
        &self,
        batches: &[GeometryBatch],
    ) -> Result<Vec<Option<TextureBinding>>, GfxError> {
        batches
            .iter()
            .map(|batch| {
                let state = &batch.state;
                let name = match &state.texture {
                    Some(name) if state.texture_enable => name,
                    _ => return Ok(None),
                };
                let texture = self.assets.textures.resolve(name)?.clone();
                let (wrap_s, wrap_t) = match &state.tile {
                    Some(tile) => (WrapMode::from(tile.cms), WrapMode::from(tile.cmt)),
                    None => (WrapMode::default(), WrapMode::default()),
                };
                let scale = state
                    .texture_scale
                    .map(|scale| scale.to_f32())
                    .unwrap_or([1.0, 1.0]);
                Ok(Some(TextureBinding {
                    texture,
                    wrap_s,
                    wrap_t,
                    scale,
                }))
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_object_transform() {
        let mut object = ObjectPlacement::new("coin");
        object.position = [100.0, 0.0, 0.0];
        object.area_offset = [0.0, 0.0, 50.0];
        object.rotation = [0.0, 90.0, 0.0];
        object.scale = 2.0;

        let p = object.transform().transform_point([1.0, 0.0, 0.0]);
        assert!((p[0] - 100.0).abs() < 1e-4);
        assert!(p[1].abs() < 1e-4);
        assert!((p[2] - 48.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_order() {
        // Yaw is applied before pitch.
        let mut object = ObjectPlacement::new("coin");
        object.rotation = [90.0, 90.0, 0.0];
        let p = object.transform().transform_point([1.0, 0.0, 0.0]);
        assert!(p[0].abs() < 1e-4);
        assert!((p[1] - 1.0).abs() < 1e-4);
        assert!(p[2].abs() < 1e-4);
    }

    #[test]
    fn test_placement_defaults() {
        let object: ObjectPlacement = serde_json::from_str(r#"{ "model": "goomba" }"#).unwrap();
        assert_eq!(object, ObjectPlacement::new("goomba"));
    }
}
