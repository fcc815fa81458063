use core::fmt;
use std::{
    error::Error,
    fs, io,
    path::{Path, PathBuf},
};

use lakitu_scene::{ObjectPlacement, SceneAssets, SceneConfig};
use lakitu_source::{
    preprocess::{body_lines, declared_type, keep_version_us, split_structs},
    Namespace, SourceError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything needed to compile one scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct SceneBundle {
    #[serde(flatten)]
    pub(crate) assets: SceneAssets,
    #[serde(default)]
    pub(crate) objects: Vec<ObjectPlacement>,
    /// C source files whose declarations are added to the assets, relative to the
    /// bundle file.
    #[serde(default)]
    pub(crate) c_files: Vec<PathBuf>,
}

#[derive(Debug)]
pub(crate) enum BundleError {
    Io { path: PathBuf, error: io::Error },
    Json { path: PathBuf, error: serde_json::Error },
    Source { path: PathBuf, error: SourceError },
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleError::Io { path, error } => write!(f, "{}: {}", path.display(), error),
            BundleError::Json { path, error } => write!(f, "{}: {}", path.display(), error),
            BundleError::Source { path, error } => write!(f, "{}: {}", path.display(), error),
        }
    }
}

impl Error for BundleError {}

fn read(path: &Path) -> Result<String, BundleError> {
    fs::read_to_string(path).map_err(|error| BundleError::Io {
        path: path.to_owned(),
        error,
    })
}

impl SceneBundle {
    /// Reads a JSON bundle and indexes the C files it lists.
    pub(crate) fn load(path: &Path) -> Result<Self, BundleError> {
        let text = read(path)?;
        let mut bundle: SceneBundle =
            serde_json::from_str(&text).map_err(|error| BundleError::Json {
                path: path.to_owned(),
                error,
            })?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        for c_file in bundle.c_files.clone() {
            let c_path = dir.join(&c_file);
            let source = read(&c_path)?;
            let count = index_c_source(&mut bundle.assets, &source).map_err(|error| {
                BundleError::Source {
                    path: c_path.clone(),
                    error,
                }
            })?;
            debug!("indexed {} declarations from {}", count, c_path.display());
        }

        info!(
            "loaded bundle {}: {} sources, {} vertex buffers, {} objects",
            path.display(),
            bundle.assets.sources.len(),
            bundle.assets.vertices.len(),
            bundle.objects.len()
        );
        Ok(bundle)
    }
}

/// Reads a [SceneConfig] from a JSON file. Missing fields take their defaults.
pub(crate) fn load_config(path: &Path) -> Result<SceneConfig, BundleError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|error| BundleError::Json {
        path: path.to_owned(),
        error,
    })
}

/// Adds the layouts, display lists, vertex buffers, and lights declared in a C source
/// file. Returns the number of declarations added.
pub(crate) fn index_c_source(assets: &mut SceneAssets, source: &str) -> Result<usize, SourceError> {
    let source = keep_version_us(source);
    let mut count = 0;
    for (name, body) in split_structs(&source) {
        match declared_type(&source, &name).as_deref() {
            Some("GeoLayout") => {
                assets
                    .sources
                    .insert(Namespace::Geo, name, body_lines(&body));
            }
            Some("Gfx") => {
                assets
                    .sources
                    .insert(Namespace::Gfx, name, body_lines(&body));
            }
            Some("Vtx") => assets.vertices.insert_initializer(name, &body)?,
            Some("Lights1") => assets.lights.insert_initializer(name, &body)?,
            _ => continue,
        }
        count += 1;
    }
    Ok(count)
}
