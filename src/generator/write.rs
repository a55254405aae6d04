use crate::error::GenError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// What writing an artifact did to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStatus {
    Created,
    Updated,
    /// Existing file already held the same bytes and was left alone
    Unchanged,
}

/// Replace `path` with `contents` atomically.
///
/// Output goes to a temporary file in the destination directory which is
/// then renamed over `path`, so readers see either the old or the new file,
/// never a partial one. Identical contents leave the file untouched.
pub fn write_atomic(path: &Path, contents: &str) -> Result<WriteStatus, GenError> {
    let existed = match std::fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => return Ok(WriteStatus::Unchanged),
        Ok(_) => true,
        Err(_) => false,
    };
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| GenError::io(parent, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| GenError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| GenError::io(path, e.error))?;

    Ok(if existed {
        WriteStatus::Updated
    } else {
        WriteStatus::Created
    })
}
