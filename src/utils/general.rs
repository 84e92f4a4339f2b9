//! File and input helpers shared by commands.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::error::ToolError;

/// Replaces a file's content through a temporary file in the same directory.
///
/// Existing permissions are carried over. Readers see either the old or the
/// new content, never a partial write.
pub fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp.write_all(content)
        .context("Failed to write temporary file")?;
    temp.as_file()
        .sync_all()
        .context("Failed to flush temporary file")?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .context("Failed to copy file permissions")?;
    }

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Puts a file back the way it was: previous bytes, or absent.
pub fn restore_file(path: &Path, previous: Option<&[u8]>) -> Result<()> {
    match previous {
        Some(bytes) => write_atomically(path, bytes),
        None => match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        },
    }
}

/// Reads proposed content from a file, or from stdin when the path is `-`.
pub fn read_content(source: &Path) -> Result<String> {
    let bytes = if source.as_os_str() == "-" {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read content from stdin")?;
        buffer
    } else {
        fs::read(source).map_err(|e| {
            ToolError::Usage(format!("cannot read content file {}: {e}", source.display()))
        })?
    };

    String::from_utf8(bytes)
        .map_err(|_| ToolError::Usage("proposed content is not valid UTF-8".to_string()).into())
}

/// Reads piped content, or `None` when nothing was piped in.
pub fn read_piped<R: Read>(mut reader: R) -> Result<Option<String>> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .context("Failed to read content from stdin")?;
    if buffer.is_empty() {
        return Ok(None);
    }
    String::from_utf8(buffer)
        .map(Some)
        .map_err(|_| ToolError::Usage("proposed content is not valid UTF-8".to_string()).into())
}
