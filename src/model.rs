//! Canonical contact model shared by every import format.
//!
//! Parsers never build a [`Contact`] directly. They feed a [`ContactBuilder`]
//! while walking one record and call [`ContactBuilder::finish`] once at the end,
//! so a half-populated contact can never leave the parser.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ValueError;

pub const UNKNOWN_NAME: &str = "Unknown";

/// Minimum length for a bare (scheme-less) base64 blob to be treated as an image.
const MIN_BARE_BASE64_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Phone {
    pub number: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Email {
    pub address: String,
    pub label: String,
}

/// Catch-all entry for websites, custom dates and vendor extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extra {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub display_name: String,
    pub organization: Option<String>,
    pub title: Option<String>,
    /// Stored with real newlines; exporters re-escape them.
    pub note: Option<String>,
    pub photo_reference: Option<String>,
    pub birthday: Option<String>,
    pub phones: Vec<Phone>,
    pub emails: Vec<Email>,
    pub address: Option<String>,
    pub extras: Vec<Extra>,
}

/// Shape of a photo reference, as far as a renderer needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Url,
    DataUri,
    Base64,
    Unrecognized,
}

impl Contact {
    pub fn photo_kind(&self) -> Option<PhotoKind> {
        let photo = self.photo_reference.as_deref()?.trim();
        if photo.is_empty() {
            return None;
        }
        let kind = if photo.starts_with("http") {
            PhotoKind::Url
        } else if photo.starts_with("data:") {
            PhotoKind::DataUri
        } else if photo.len() > MIN_BARE_BASE64_LEN
            && photo
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        {
            PhotoKind::Base64
        } else {
            PhotoKind::Unrecognized
        };
        Some(kind)
    }

    /// Photo reference in a form an image renderer can load directly.
    pub fn photo_source(&self) -> Option<String> {
        let photo = self.photo_reference.as_deref()?.trim();
        match self.photo_kind()? {
            PhotoKind::Url | PhotoKind::DataUri => Some(photo.to_string()),
            PhotoKind::Base64 => Some(format!("data:image/jpeg;base64,{photo}")),
            PhotoKind::Unrecognized => None,
        }
    }

    /// Secondary line for list rows.
    pub fn subtitle(&self) -> &str {
        self.organization
            .as_deref()
            .or_else(|| self.phones.first().map(|p| p.number.as_str()))
            .unwrap_or("No information")
    }
}

/// What to do with a record whose display name cannot be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePolicy {
    Drop,
    Placeholder,
}

impl FromStr for NamePolicy {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(NamePolicy::Drop),
            "placeholder" | "unknown" => Ok(NamePolicy::Placeholder),
            _ => Err(ValueError::NamePolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct ContactBuilder {
    display_name: Option<String>,
    fallback_name: Option<String>,
    organization: Option<String>,
    title: Option<String>,
    note: Option<String>,
    photo_reference: Option<String>,
    birthday: Option<String>,
    address: Option<String>,
    phones: Vec<Phone>,
    emails: Vec<Email>,
    extras: Vec<Extra>,
}

impl ContactBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_name(&mut self, value: &str) {
        set_text(&mut self.display_name, value);
    }

    /// Name used only when no explicit display name was supplied.
    pub fn fallback_name(&mut self, value: &str) {
        set_text(&mut self.fallback_name, value);
    }

    pub fn has_fallback_name(&self) -> bool {
        self.fallback_name.is_some()
    }

    pub fn organization(&mut self, value: &str) {
        set_text(&mut self.organization, value);
    }

    pub fn title(&mut self, value: &str) {
        set_text(&mut self.title, value);
    }

    pub fn note(&mut self, value: &str) {
        set_text(&mut self.note, value);
    }

    pub fn photo(&mut self, value: &str) {
        set_text(&mut self.photo_reference, value);
    }

    pub fn birthday(&mut self, value: &str) {
        set_text(&mut self.birthday, value);
    }

    pub fn address(&mut self, value: &str) {
        set_text(&mut self.address, value);
    }

    /// Appends an address fragment unless the accumulated address already contains it.
    pub fn address_fragment(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        match self.address.as_mut() {
            Some(existing) => {
                if !existing.contains(fragment) {
                    existing.push_str(", ");
                    existing.push_str(fragment);
                }
            }
            None => self.address = Some(fragment.to_string()),
        }
    }

    pub fn phone(&mut self, number: &str, label: &str) {
        let number = number.trim();
        if !number.is_empty() {
            self.phones.push(Phone {
                number: number.to_string(),
                label: label.to_string(),
            });
        }
    }

    pub fn email(&mut self, address: &str, label: &str) {
        let address = address.trim();
        if !address.is_empty() {
            self.emails.push(Email {
                address: address.to_string(),
                label: label.to_string(),
            });
        }
    }

    pub fn extra(&mut self, label: &str, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.extras.push(Extra {
                label: label.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Finalize the record. Returns `None` when no name can be derived and the
    /// policy says to drop such records.
    pub fn finish(self, policy: NamePolicy) -> Option<Contact> {
        let display_name = self
            .display_name
            .or(self.fallback_name)
            .or_else(|| self.organization.clone())
            .or_else(|| match policy {
                NamePolicy::Placeholder => Some(UNKNOWN_NAME.to_string()),
                NamePolicy::Drop => None,
            })?;

        Some(Contact {
            display_name,
            organization: self.organization,
            title: self.title,
            note: self.note,
            photo_reference: self.photo_reference,
            birthday: self.birthday,
            phones: self.phones,
            emails: self.emails,
            address: self.address,
            extras: self.extras,
        })
    }
}

fn set_text(slot: &mut Option<String>, value: &str) {
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        *slot = Some(trimmed.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LibraryFormat {
    #[serde(rename = "CSV")]
    Csv,
    #[serde(rename = "VCARD")]
    Vcard,
}

impl LibraryFormat {
    /// `.csv` in any case selects the CSV path; everything else is read as vCard.
    pub fn from_file_name(name: &str) -> Self {
        if name.to_ascii_lowercase().ends_with(".csv") {
            LibraryFormat::Csv
        } else {
            LibraryFormat::Vcard
        }
    }
}

impl fmt::Display for LibraryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryFormat::Csv => f.write_str("CSV"),
            LibraryFormat::Vcard => f.write_str("VCARD"),
        }
    }
}

impl FromStr for LibraryFormat {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(LibraryFormat::Csv),
            "vcard" | "vcf" => Ok(LibraryFormat::Vcard),
            _ => Err(ValueError::Format(s.to_string())),
        }
    }
}

/// Parse result for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Library {
    pub name: String,
    pub format: LibraryFormat,
    pub contacts: Vec<Contact>,
}

impl Library {
    /// File name without its `.vcf`/`.csv` extension.
    pub fn title(&self) -> &str {
        let lower = self.name.to_ascii_lowercase();
        if lower.ends_with(".vcf") || lower.ends_with(".csv") {
            &self.name[..self.name.len() - 4]
        } else {
            &self.name
        }
    }
}
