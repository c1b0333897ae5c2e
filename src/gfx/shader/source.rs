//! Shader source loading
//!
//! Sources are read wholesale and handed to the compiler verbatim. There is no
//! preprocessing and no include resolution.

use std::{fs, path::Path};

use super::{ShaderError, ShaderStage};

/// Reads the source text for `stage` from `path`
///
/// A missing or unreadable file and an empty (or whitespace-only) file are
/// reported as distinct errors naming the stage and the path.
pub fn read_source(stage: ShaderStage, path: &Path) -> Result<String, ShaderError> {
    let source = fs::read_to_string(path).map_err(|source| ShaderError::Read {
        stage,
        path: path.to_path_buf(),
        source,
    })?;

    if source.trim().is_empty() {
        return Err(ShaderError::EmptySource {
            stage,
            path: path.to_path_buf(),
        });
    }

    log::debug!(
        "read {} bytes of {} shader source from '{}'",
        source.len(),
        stage,
        path.display()
    );
    Ok(source)
}
