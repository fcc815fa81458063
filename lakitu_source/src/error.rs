#![allow(missing_docs)]

use core::fmt;
use std::error::Error;

use crate::Namespace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    ParseError { message: String },
    NotFound { namespace: Namespace, name: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::ParseError { message } => write!(f, "parse error: {}", message),
            SourceError::NotFound { namespace, name } => {
                write!(f, "undefined {} source: {}", namespace, name)
            }
        }
    }
}

impl Error for SourceError {}
