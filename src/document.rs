//! Persisted diagram documents.
//!
//! A document is the positioned [`Diagram`] in its camelCase JSON form, the
//! same shape the editor canvas consumes. Reloading a document yields an equal
//! diagram without re-parsing the source text.

use crate::error::Result;
use crate::ir::Diagram;
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

impl Diagram {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

pub fn write_document(path: &Path, diagram: &Diagram) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, diagram)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    debug!(
        path = path.display().to_string(),
        nodes = diagram.nodes.len(),
        edges = diagram.edges.len();
        "document written"
    );
    Ok(())
}

pub fn read_document(path: &Path) -> Result<Diagram> {
    let file = File::open(path)?;
    let diagram: Diagram = serde_json::from_reader(BufReader::new(file))?;
    Ok(diagram)
}
