//! Laptop files: a binary rkyv archive and a pretty-printed JSON document.

use std::fs;
use std::path::Path;

use rkyv::Deserialize;
use thiserror::Error;

use crate::model::Laptop;

#[derive(Error, Debug)]
pub enum SerializerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, SerializerError>;

pub fn write_binary_file(laptop: &Laptop, path: impl AsRef<Path>) -> Result<()> {
    let bytes = rkyv::to_bytes::<_, 1024>(laptop)
    .map_err(|e| SerializerError::Archive(e.to_string()))?;
    fs::write(path, bytes.as_slice())?;
    Ok(())
}

/// Read a file written by [`write_binary_file`]. The archive is validated
/// before anything is deserialized.
pub fn read_binary_file(path: impl AsRef<Path>) -> Result<Laptop> {
    let data = fs::read(path)?;

    // Archives must be read from aligned memory
    let mut aligned = rkyv::AlignedVec::with_capacity(data.len());
    aligned.extend_from_slice(&data);

    let archived = rkyv::check_archived_root::<Laptop>(&aligned)
    .map_err(|e| SerializerError::Archive(e.to_string()))?;

    archived
    .deserialize(&mut rkyv::Infallible)
    .map_err(|_| SerializerError::Archive("cannot deserialize laptop".to_string()))
}

pub fn to_json(laptop: &Laptop) -> Result<String> {
    Ok(serde_json::to_string_pretty(laptop)?)
}

pub fn write_json_file(laptop: &Laptop, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, to_json(laptop)?)?;
    Ok(())
}

pub fn read_json_file(path: impl AsRef<Path>) -> Result<Laptop> {
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Write JSON for `.json` paths and the binary archive for anything else.
pub fn write_file(laptop: &Laptop, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if is_json(path) {
        write_json_file(laptop, path)
    } else {
        write_binary_file(laptop, path)
    }
}

/// Counterpart of [`write_file`].
pub fn read_file(path: impl AsRef<Path>) -> Result<Laptop> {
    let path = path.as_ref();
    if is_json(path) {
        read_json_file(path)
    } else {
        read_binary_file(path)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
