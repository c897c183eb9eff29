use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use rayon::prelude::*;

use crate::import::ParseOptions;
use crate::library::{self, SourceFile};
use crate::model::Library;

const CONTACT_EXTENSIONS: [&str; 2] = ["vcf", "csv"];

/// Regular files directly inside `dir` with a `.vcf`/`.csv` extension (any case),
/// sorted by file name.
pub fn list_contact_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_contact_file(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn is_contact_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            CONTACT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Read a file as text. Invalid UTF-8 sequences are replaced rather than rejected.
pub fn read_source(path: &Path) -> Result<SourceFile> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read contact file {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile {
        name,
        content: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Discover, read and parse every contact file in `dir`. A file that cannot be
/// read is reported and skipped; only an unreadable directory is an error.
pub fn load_libraries(dir: &Path, options: &ParseOptions) -> Result<Vec<Library>> {
    let paths = list_contact_files(dir)?;
    let sources: Vec<SourceFile> = paths
        .par_iter()
        .filter_map(|path| match read_source(path) {
            Ok(source) => Some(source),
            Err(err) => {
                warn!(
                    "event=file_read module=scan status=error path={} error={:#}",
                    path.display(),
                    err
                );
                eprintln!("warning: skipping {}: {err:#}", path.display());
                None
            }
        })
        .collect();

    Ok(library::assemble_all(&sources, options))
}
