#![allow(missing_docs)]

use core::fmt;
use std::error;

use lakitu_geo::GeoError;
use lakitu_gfx::GfxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    Geo(GeoError),
    Gfx(GfxError),
    UnknownObjectModel { model: String },
    MissingAnimation { name: String },
}

impl SceneError {
    /// Returns true if the error is a missing reference.
    pub fn is_resolution(&self) -> bool {
        match self {
            SceneError::Geo(error) => error.is_resolution(),
            SceneError::Gfx(error) => error.is_resolution(),
            SceneError::UnknownObjectModel { .. } | SceneError::MissingAnimation { .. } => true,
        }
    }
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Geo(error) => write!(f, "{}", error),
            SceneError::Gfx(error) => write!(f, "{}", error),
            SceneError::UnknownObjectModel { model } => write!(f, "unknown object model: {}", model),
            SceneError::MissingAnimation { name } => write!(f, "undefined animation: {}", name),
        }
    }
}

impl error::Error for SceneError {}

impl From<GeoError> for SceneError {
    fn from(v: GeoError) -> Self {
        Self::Geo(v)
    }
}

impl From<GfxError> for SceneError {
    fn from(v: GfxError) -> Self {
        Self::Gfx(v)
    }
}
