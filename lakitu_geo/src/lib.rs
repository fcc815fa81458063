//! Flattening of geo layout scene graphs.
//!
//! A geo layout is a named list of `GEO_*` macro calls describing a tree of transform
//! nodes with display lists attached. [interpret::interpret_geo_layout] walks the tree
//! (following branches into other layouts) and returns a flat list of
//! [node::Placement]s, each pairing a display list with its model-space transform.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub use error::*;

pub mod animation;
pub mod cmd;
pub mod decode;
mod error;
pub mod interpret;
pub mod node;
