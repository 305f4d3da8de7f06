use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::osm::ElementReader;

pub fn open(path: &Path) -> Result<BufReader<File>> {
    let f = File::open(path).with_context(|| format!("cannot open {path:?}"))?;
    Ok(BufReader::new(f))
}

pub fn create(path: &Path) -> Result<BufWriter<File>> {
    let f = File::create(path).with_context(|| format!("cannot create {path:?}"))?;
    Ok(BufWriter::new(f))
}

/// Stream the top-level elements of the OSM XML file at `path`.
pub fn load_elements(path: &Path) -> Result<ElementReader<BufReader<File>>> {
    Ok(ElementReader::new(open(path)?))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    serde_json::from_reader(open(path)?).with_context(|| format!("cannot parse {path:?}"))
}

/// Write `items` as a JSON array with one item per line. Pass a buffered writer for files.
pub fn write_json_array<T: Serialize>(items: &[T], mut out: impl io::Write) -> Result<()> {
    write!(out, "[")?;
    for (i, item) in items.iter().enumerate() {
        let separator = if i == 0 { "\n" } else { ",\n" };
        write!(out, "{separator}")?;
        serde_json::to_writer(&mut out, item)?;
    }
    writeln!(out, "\n]")?;

    out.flush()?;

    Ok(())
}
