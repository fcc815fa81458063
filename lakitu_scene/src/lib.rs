//! Compiles object placements into draw items for a renderer.
//!
//! Each object names a model, whose geo layout is flattened into placements. Each
//! placement's display list is interpreted into geometry batches (cached by name), and
//! the batch textures are resolved.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub use compile::*;
pub use config::*;
pub use error::*;
pub use render_data::*;

mod compile;
mod config;
mod error;
mod render_data;
