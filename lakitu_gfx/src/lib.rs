//! Decoding and interpreting of display list source text.
//!
//! A display list is a named sequence of `gs*` macro calls that mutate a render state and
//! draw triangles. [interpret::interpret_display_list] walks one list (and the lists it
//! calls) and produces [interpret::GeometryBatch]es that are straightforward to render.
//!
//! The [util] module also holds the matrix type used for scene graph transforms.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::needless_range_loop)]

pub use error::*;

pub mod cmd;
pub mod decode;
mod error;
pub mod interpret;
pub mod state;
pub mod tables;
pub mod util;
