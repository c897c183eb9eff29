//! Format parsers feeding the canonical contact model.

pub mod csv_fields;
pub mod csv_lines;
pub mod unfold;
pub mod vcard;

use crate::dates::DateLocale;
use crate::model::{Contact, LibraryFormat, NamePolicy};
use crate::search;

/// Knobs the parsers need. Built from configuration by the caller; the parsers
/// never read configuration themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub csv_unnamed: NamePolicy,
    pub vcard_unnamed: NamePolicy,
    pub locale: DateLocale,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            csv_unnamed: NamePolicy::Drop,
            vcard_unnamed: NamePolicy::Placeholder,
            locale: DateLocale::default(),
        }
    }
}

/// Parse one file's text with the parser for `format` and sort the result by
/// display name. Malformed input yields fewer (possibly zero) contacts, never an error.
pub fn parse(format: LibraryFormat, content: &str, options: &ParseOptions) -> Vec<Contact> {
    let mut contacts = match format {
        LibraryFormat::Csv => csv_fields::parse_csv(content, options),
        LibraryFormat::Vcard => vcard::parse_vcard(content, options),
    };
    search::sort_contacts(&mut contacts);
    contacts
}
