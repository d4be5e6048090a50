//! Source directory packaging. The archive builder lives and dies inside a
//! single [`pack_directory`] call.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip the directory at `source` into an in-memory buffer.
///
/// Paths inside the archive are relative to `source`. Entries are added in
/// sorted order so the same tree always produces the same archive.
pub fn pack_directory(source: &Path) -> Result<Vec<u8>> {
    if !source.exists() {
        bail!("Function path '{}' does not exist", source.display());
    }
    if !source.is_dir() {
        bail!("Function path '{}' is not a directory", source.display());
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let entries = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read '{}'", source.display()))?;

    for entry in &entries {
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("Walked entry outside the source root")?;
        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            zip.add_directory(name.as_str(), options)
                .with_context(|| format!("Failed to add directory '{}'", name))?;
        } else {
            debug!("Adding {}", name);
            let bytes = fs::read(entry.path())
                .with_context(|| format!("Failed to read '{}'", entry.path().display()))?;
            zip.start_file(name.as_str(), options)
                .with_context(|| format!("Failed to add '{}'", name))?;
            zip.write_all(&bytes)
                .with_context(|| format!("Failed to write '{}'", name))?;
        }
    }

    let cursor = zip.finish().context("Failed to finalize archive")?;
    Ok(cursor.into_inner())
}
