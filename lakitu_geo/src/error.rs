#![allow(missing_docs)]

use core::fmt;
use std::error;

use lakitu_source::SourceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    Decode {
        layout: String,
        line: usize,
        message: String,
    },
    MissingLayout {
        name: String,
    },
    BranchCycle {
        name: String,
    },
    DepthExceeded {
        name: String,
    },
}

impl GeoError {
    /// Returns true if the error is a missing reference that a caller may skip over.
    pub fn is_resolution(&self) -> bool {
        matches!(self, GeoError::MissingLayout { .. })
    }

    pub(crate) fn decode(layout: &str, line: usize, error: SourceError) -> Self {
        GeoError::Decode {
            layout: layout.to_owned(),
            line,
            message: match error {
                SourceError::ParseError { message } => message,
                error => error.to_string(),
            },
        }
    }
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::Decode {
                layout,
                line,
                message,
            } => write!(f, "in {} line {}: {}", layout, line + 1, message),
            GeoError::MissingLayout { name } => write!(f, "undefined geo layout: {}", name),
            GeoError::BranchCycle { name } => write!(f, "geo layout branches into itself: {}", name),
            GeoError::DepthExceeded { name } => {
                write!(f, "geo branch depth exceeded at {}", name)
            }
        }
    }
}

impl error::Error for GeoError {}
