//! Wraps parsed contacts with their source metadata.

use log::{debug, info};
use rayon::prelude::*;

use crate::import::{self, ParseOptions};
use crate::model::{Library, LibraryFormat};
use crate::search;

/// Decoded text of one discovered file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

/// Parse one file into a library. Returns `None` when nothing usable was found,
/// so the file never shows up as an empty library.
pub fn assemble(name: &str, content: &str, options: &ParseOptions) -> Option<Library> {
    let format = LibraryFormat::from_file_name(name);
    let contacts = import::parse(format, content, options);
    if contacts.is_empty() {
        debug!(
            "event=library_assemble module=library status=dropped format={} name={}",
            format, name
        );
        return None;
    }

    Some(Library {
        name: name.to_string(),
        format,
        contacts,
    })
}

/// Parse every file independently (in parallel) and return the non-empty
/// libraries sorted by name.
pub fn assemble_all(files: &[SourceFile], options: &ParseOptions) -> Vec<Library> {
    let mut libraries: Vec<Library> = files
        .par_iter()
        .filter_map(|file| assemble(&file.name, &file.content, options))
        .collect();
    search::sort_libraries(&mut libraries);

    info!(
        "event=library_assemble module=library status=ok files={} libraries={} contacts={}",
        files.len(),
        libraries.len(),
        libraries.iter().map(|l| l.contacts.len()).sum::<usize>()
    );
    libraries
}
