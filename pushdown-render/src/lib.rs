//! # pushdown-render
//!
//! Trace renderers for `pushdown-core`:
//! - [`TableRenderer`]: framed table with UTF-8 or ASCII box drawing
//! - [`JsonLinesRenderer`]: one JSON object per trace event

pub mod json;
pub mod table;

pub use json::JsonLinesRenderer;
pub use table::{Charset, CharsetKind, TableRenderer};
