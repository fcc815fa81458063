//! Access to the textual scene descriptions of a decompiled game.
//!
//! Scene-graph layouts and display lists are stored as C arrays of macro calls, one
//! call per line. This crate provides:
//! - [parse_macro_call], which turns a single line into a [MacroCall]
//! - [SourceStore], the name-keyed lookup that the interpreters read from, along with
//!   the in-memory [SourceMap] implementation
//! - [preprocess], helpers for indexing raw C source files into named structs

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub use arg::*;
pub use error::*;
pub use macro_call::*;
pub use store::*;

mod arg;
mod error;
mod macro_call;
pub mod preprocess;
mod store;
