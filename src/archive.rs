//! In-memory ZIP assembly for bulk downloads.

use std::io::{Cursor, Write};
use std::path::Path;
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive assembly failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("archive assembly failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Strip path components from an entry name to prevent traversal; fall back
/// to a placeholder for empty or degenerate names.
fn sanitize_entry_name(name: &str, fallback: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// Pack `(name, bytes)` entries into a single ZIP buffer.
///
/// Entry names are sanitized to their base name; colliding or empty names get
/// an index-derived fallback so every input appears in the archive.
pub fn build_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ArchiveError> {
    let mut buffer = Vec::new();
    {
        let mut writer = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let mut used: std::collections::HashSet<String> = std::collections::HashSet::new();
        for (index, (name, bytes)) in entries.iter().enumerate() {
            let mut entry_name = sanitize_entry_name(name, &format!("photo_{index}"));
            if !used.insert(entry_name.clone()) {
                entry_name = format!("{index}_{entry_name}");
                used.insert(entry_name.clone());
            }
            writer.start_file(&entry_name, options)?;
            writer.write_all(bytes)?;
        }
        writer.finish()?;
    }
    Ok(buffer)
}
