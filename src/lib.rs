//! Compiles SCL step/transition text into a positioned SFC diagram.
//!
//! The pipeline is a fold over source lines ([`parser`]) producing a [`Chart`],
//! a sizing pass ([`sizing`]), and a layout pass through a pluggable
//! [`LayoutEngine`] that yields a [`Diagram`] ready for storage or rendering.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod ir;
pub mod layout;
pub mod parser;
pub mod render;
pub mod sizing;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use document::{read_document, write_document};
pub use error::{Error, Result};
pub use ir::{Chart, Diagram, EdgeKind, NodeKind, SclEdge, SclNode};
pub use layout::{EngineKind, LayoutEngine, LayoutError, layout_chart};
pub use parser::{parse_scl, parse_scl_with};
pub use render::render_svg;
pub use theme::Theme;

use log::debug;

/// Compiles `text` with the default configuration.
pub fn compile(text: &str) -> Result<Diagram> {
    compile_with_options(text, &Config::default())
}

pub fn compile_with_options(text: &str, config: &Config) -> Result<Diagram> {
    let chart = parse_scl_with(text, &config.sizing);
    debug!(engine:? = config.layout.engine; "laying out chart");
    let engine = config.layout.engine.engine();
    let diagram = layout_chart(&chart, engine.as_ref(), &config.sizing, config.layout.options())?;
    Ok(diagram)
}
