#![allow(missing_docs)]

use core::fmt;
use std::error;

use lakitu_source::SourceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GfxError {
    Decode {
        list: String,
        line: usize,
        message: String,
    },
    MissingDisplayList {
        name: String,
    },
    MissingVertexBuffer {
        name: String,
    },
    MissingLight {
        name: String,
    },
    InvalidVertexIndex {
        index: u32,
        count: u32,
    },
    TriangleWithoutVertices {
        list: String,
        line: usize,
    },
    MissingTexture {
        name: String,
    },
    BranchDepthExceeded {
        name: String,
    },
}

impl GfxError {
    /// Returns true if the error is a missing reference that a caller may skip over.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            GfxError::MissingDisplayList { .. }
                | GfxError::MissingVertexBuffer { .. }
                | GfxError::MissingLight { .. }
        )
    }

    pub(crate) fn decode(list: &str, line: usize, error: SourceError) -> Self {
        GfxError::Decode {
            list: list.to_owned(),
            line,
            message: match error {
                SourceError::ParseError { message } => message,
                error => error.to_string(),
            },
        }
    }
}

impl fmt::Display for GfxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GfxError::Decode {
                list,
                line,
                message,
            } => write!(f, "in {} line {}: {}", list, line + 1, message),
            GfxError::MissingDisplayList { name } => write!(f, "undefined display list: {}", name),
            GfxError::MissingVertexBuffer { name } => {
                write!(f, "undefined vertex buffer: {}", name)
            }
            GfxError::MissingLight { name } => write!(f, "undefined light: {}", name),
            GfxError::InvalidVertexIndex { index, count } => write!(
                f,
                "vertex index {} out of range for {} loaded vertices",
                index, count
            ),
            GfxError::TriangleWithoutVertices { list, line } => {
                write!(f, "in {} line {}: triangle before any vertex load", list, line + 1)
            }
            GfxError::MissingTexture { name } => write!(f, "undefined texture: {}", name),
            GfxError::BranchDepthExceeded { name } => {
                write!(f, "display list nesting too deep at {}", name)
            }
        }
    }
}

impl error::Error for GfxError {}
