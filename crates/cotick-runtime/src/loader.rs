//! Script file loading.

use crate::error::RuntimeError;
use std::path::Path;

/// Read a script file from disk, dropping a leading UTF-8 byte order mark.
pub fn read_source(path: &Path) -> Result<String, RuntimeError> {
    let source = std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match source.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => source,
    })
}

/// Chunk name used in error locations for `path`
pub fn chunk_name(path: &Path) -> String {
    path.display().to_string()
}
