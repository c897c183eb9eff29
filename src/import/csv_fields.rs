//! Header-driven mapping of CSV rows onto the canonical contact model.
//!
//! Vendors disagree on column names, so single-valued fields are located by an
//! ordered list of exact (case-insensitive) header synonyms, and repeating
//! groups (phones, emails, addresses, websites) by substring keywords. Both
//! tables are plain data: supporting a new dialect means adding a row.

use log::debug;

use super::csv_lines::{logical_lines, split_fields};
use super::ParseOptions;
use crate::dates::normalize_birthday;
use crate::model::{Contact, ContactBuilder};

/// Separator some exporters use to pack several values into one cell.
const MULTI_VALUE_SEPARATOR: &str = ":::";

const DEFAULT_PHONE_LABEL: &str = "Mobile";
const DEFAULT_EMAIL_LABEL: &str = "Home";
const DEFAULT_WEBSITE_LABEL: &str = "Website";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Prefix,
    First,
    Middle,
    Last,
    Suffix,
    FullName,
    Organization,
    Title,
    Note,
    Photo,
    Birthday,
}

/// Exact header synonyms per field, tried in order; the first hit wins.
const FIELD_CANDIDATES: &[(Field, &[&str])] = &[
    (Field::Prefix, &["Name Prefix", "Prefix"]),
    (Field::First, &["First Name", "Given Name", "First"]),
    (Field::Middle, &["Middle Name", "Additional Name", "Middle"]),
    (Field::Last, &["Last Name", "Family Name", "Last", "Surname"]),
    (Field::Suffix, &["Name Suffix", "Suffix"]),
    (Field::FullName, &["Name", "Full Name", "Display Name"]),
    (
        Field::Organization,
        &["Organization Name", "Company", "Organization", "Work"],
    ),
    (Field::Title, &["Job Title", "Title", "Role"]),
    (Field::Note, &["Notes", "Note", "Comment"]),
    (
        Field::Photo,
        &["Photo", "Avatar", "Image", "Picture", "Profile Picture"],
    ),
    (Field::Birthday, &["Birthday", "Birth Date", "Date of Birth"]),
];

/// Name parts joined, in this order, into the display name.
const NAME_PARTS: [Field; 5] = [
    Field::Prefix,
    Field::First,
    Field::Middle,
    Field::Last,
    Field::Suffix,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Phone,
    Email,
    Address,
    Website,
}

/// Substring keywords per repeating group, checked in this order.
const GROUP_KEYWORDS: &[(Group, &[&str])] = &[
    (Group::Phone, &["phone", "mobile", "tel"]),
    (Group::Email, &["email", "mail"]),
    (Group::Address, &["address", "street", "location"]),
    (Group::Website, &["url", "website", "link"]),
];

/// Headers carrying any of these describe a neighbouring value column.
const LABEL_KEYWORDS: &[&str] = &["type", "label", "category"];

#[derive(Debug)]
struct ValueColumn {
    index: usize,
    group: Group,
    label_index: Option<usize>,
}

#[derive(Debug)]
struct ColumnMap {
    fields: Vec<(Field, usize)>,
    values: Vec<ValueColumn>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Self {
        let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

        let fields = FIELD_CANDIDATES
            .iter()
            .filter_map(|(field, candidates)| {
                find_column(&lower, candidates).map(|index| (*field, index))
            })
            .collect();

        let values = lower
            .iter()
            .enumerate()
            .filter(|(_, header)| !LABEL_KEYWORDS.iter().any(|k| header.contains(k)))
            .filter_map(|(index, header)| {
                classify_group(header).map(|group| ValueColumn {
                    index,
                    group,
                    label_index: paired_label_column(&lower, header),
                })
            })
            .collect();

        Self { fields, values }
    }

    fn column(&self, field: Field) -> Option<usize> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, index)| *index)
    }
}

/// Index of the first candidate that exactly matches a (lowercased) header.
fn find_column(lower_headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        let candidate = candidate.to_lowercase();
        lower_headers.iter().position(|h| *h == candidate)
    })
}

fn classify_group(lower_header: &str) -> Option<Group> {
    GROUP_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower_header.contains(k)))
        .map(|(group, _)| *group)
}

/// For `Phone 1 - Value`, the column named `Phone 1 - Type` or `Phone 1 - Label`.
fn paired_label_column(lower_headers: &[String], lower_header: &str) -> Option<usize> {
    if !lower_header.contains("value") {
        return None;
    }
    ["type", "label"].iter().find_map(|replacement| {
        let sibling = lower_header.replace("value", replacement);
        lower_headers.iter().position(|h| *h == sibling)
    })
}

fn clean_header(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.to_string()
}

fn split_values(cell: &str) -> impl Iterator<Item = &str> {
    split_slots(cell).map(|(_, value)| value)
}

/// Non-empty sub-values with their position among all `:::` slots, so empty
/// or rejected slots still count when pairing with labels.
fn split_slots(cell: &str) -> impl Iterator<Item = (usize, &str)> {
    cell.split(MULTI_VALUE_SEPARATOR)
        .map(str::trim)
        .enumerate()
        .filter(|(_, v)| !v.is_empty())
}

/// One entry per `:::` slot; empty slots stay `None` to keep positions aligned.
fn split_labels(cell: &str) -> Vec<Option<String>> {
    cell.split(MULTI_VALUE_SEPARATOR)
        .map(|label| label.trim().trim_start_matches('*').trim())
        .map(|label| (!label.is_empty()).then(|| label.to_string()))
        .collect()
}

/// Parse CSV text into contacts in row order.
pub fn parse_csv(content: &str, options: &ParseOptions) -> Vec<Contact> {
    let lines = logical_lines(content);
    if lines.len() < 2 {
        debug!(
            "event=csv_parse module=csv status=empty lines={}",
            lines.len()
        );
        return Vec::new();
    }

    let headers: Vec<String> = split_fields(&lines[0])
        .iter()
        .map(|h| clean_header(h))
        .collect();
    let columns = ColumnMap::from_headers(&headers);

    let contacts: Vec<Contact> = lines[1..]
        .iter()
        .filter_map(|line| map_row(&split_fields(line), &columns, options))
        .collect();

    debug!(
        "event=csv_parse module=csv status=ok columns={} rows={} contacts={}",
        headers.len(),
        lines.len() - 1,
        contacts.len()
    );
    contacts
}

fn map_row(row: &[String], columns: &ColumnMap, options: &ParseOptions) -> Option<Contact> {
    if row.iter().all(|cell| cell.trim().is_empty()) {
        return None;
    }

    let cell = |index: usize| row.get(index).map(|c| c.trim()).unwrap_or("");
    let field = |field: Field| columns.column(field).map(cell).unwrap_or("");

    let mut builder = ContactBuilder::new();

    let name = NAME_PARTS
        .iter()
        .map(|part| single_line(field(*part)))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    builder.display_name(&name);
    builder.fallback_name(&single_line(field(Field::FullName)));
    builder.organization(&single_line(field(Field::Organization)));
    builder.title(&single_line(field(Field::Title)));
    builder.note(field(Field::Note));
    builder.photo(field(Field::Photo));

    let birthday = field(Field::Birthday);
    if !birthday.is_empty() {
        builder.birthday(&normalize_birthday(birthday, options.locale));
    }

    for column in &columns.values {
        let value = cell(column.index);
        if value.is_empty() {
            continue;
        }
        let labels = column
            .label_index
            .map(|index| split_labels(cell(index)))
            .unwrap_or_default();
        let label_for = |position: usize, default: &str| -> String {
            labels
                .get(position)
                .cloned()
                .flatten()
                .or_else(|| labels.first().cloned().flatten())
                .unwrap_or_else(|| default.to_string())
        };

        match column.group {
            Group::Phone => {
                for (i, v) in split_slots(value) {
                    if v.chars().any(|c| c.is_ascii_digit()) {
                        builder.phone(v, &label_for(i, DEFAULT_PHONE_LABEL));
                    }
                }
            }
            Group::Email => {
                for (i, v) in split_slots(value) {
                    if v.contains('@') {
                        builder.email(v, &label_for(i, DEFAULT_EMAIL_LABEL));
                    }
                }
            }
            Group::Address => {
                for fragment in split_values(value) {
                    builder.address_fragment(&flatten_lines(fragment));
                }
            }
            Group::Website => {
                for (i, v) in split_slots(value) {
                    if v.contains('.') || v.starts_with("http") {
                        builder.extra(&label_for(i, DEFAULT_WEBSITE_LABEL), v);
                    }
                }
            }
        }
    }

    builder.finish(options.csv_unnamed)
}

/// Quoted cells may carry raw newlines; single-valued text fields keep one line.
fn single_line(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn flatten_lines(fragment: &str) -> String {
    fragment
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
