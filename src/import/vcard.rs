//! Property resolution for vCard cards.
//!
//! Each card is resolved in two passes over its unfolded lines. The first pass
//! collects `group.X-ABLabel` lines into a read-only map from group token to
//! label; the second maps every other property onto a [`ContactBuilder`],
//! consulting that map. Label lines may therefore appear before or after the
//! properties they name.

use std::collections::HashMap;

use log::debug;

use super::unfold::card_groups;
use super::ParseOptions;
use crate::dates::normalize_birthday;
use crate::model::{Contact, ContactBuilder};

const LABEL_PROPERTY: &str = "X-ABLABEL";
const DEFAULT_TEL_LABEL: &str = "CELL";
const DEFAULT_EMAIL_LABEL: &str = "HOME";
const WHATSAPP_LABEL: &str = "WHATSAPP";

/// TYPE values that say nothing about what kind of entry this is.
const GENERIC_TYPES: [&str; 3] = ["PREF", "INTERNET", "VOICE"];

/// Bare vCard 2.1 parameters that describe encoding rather than type.
const ENCODING_TOKENS: [&str; 5] = ["QUOTED-PRINTABLE", "BASE64", "B", "8BIT", "7BIT"];

/// Labels keyed by lowercased group token, scoped to one card.
type GroupLabels = HashMap<String, String>;

/// A `[group.]name[;param...]:value` content line.
#[derive(Debug)]
struct ContentLine<'a> {
    raw: &'a str,
    group: Option<&'a str>,
    name: String,
    params: Vec<&'a str>,
    value: &'a str,
}

fn parse_content_line(raw: &str) -> Option<ContentLine<'_>> {
    let (lhs, value) = raw.split_once(':')?;
    let mut parts = lhs.split(';');
    let property = parts.next()?.trim();
    let (group, name) = split_group(property);
    if name.is_empty() {
        return None;
    }

    Some(ContentLine {
        raw,
        group,
        name: name.to_ascii_uppercase(),
        params: parts.map(str::trim).filter(|p| !p.is_empty()).collect(),
        value: value.trim(),
    })
}

fn split_group(property: &str) -> (Option<&str>, &str) {
    match property.split_once('.') {
        Some((group, name)) => (Some(group), name),
        None => (None, property),
    }
}

impl ContentLine<'_> {
    fn named_param(&self, wanted: &str) -> Option<String> {
        self.params.iter().find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case(wanted)
                .then(|| clean_quotes(value))
        })
    }

    /// TYPE values, including bare 2.1-style parameters such as `TEL;CELL:`.
    fn type_values(&self) -> Vec<String> {
        let mut values = Vec::new();
        for param in &self.params {
            match param.split_once('=') {
                Some((name, value)) => {
                    if name.trim().eq_ignore_ascii_case("TYPE") {
                        values.extend(
                            value
                                .split(',')
                                .map(clean_quotes)
                                .filter(|v| !v.is_empty()),
                        );
                    }
                }
                None => {
                    if !ENCODING_TOKENS
                        .iter()
                        .any(|token| param.eq_ignore_ascii_case(token))
                    {
                        values.push(param.to_string());
                    }
                }
            }
        }
        values
    }

    fn type_label(&self) -> Option<String> {
        let values = self.type_values();
        values
            .iter()
            .find(|v| !GENERIC_TYPES.iter().any(|g| v.eq_ignore_ascii_case(g)))
            .or_else(|| values.first())
            .cloned()
    }

    fn is_quoted_printable(&self) -> bool {
        self.params.iter().any(|param| match param.split_once('=') {
            Some((name, value)) => {
                name.trim().eq_ignore_ascii_case("ENCODING")
                    && value.trim().eq_ignore_ascii_case("QUOTED-PRINTABLE")
            }
            None => param.eq_ignore_ascii_case("QUOTED-PRINTABLE"),
        })
    }

    fn mentions_whatsapp(&self) -> bool {
        self.params
            .iter()
            .any(|param| param.to_ascii_uppercase().contains(WHATSAPP_LABEL))
    }

    /// Decoded value: quoted-printable is decoded when declared, falling back to
    /// the raw text if the escape sequences are broken.
    fn decoded_value(&self) -> String {
        if self.is_quoted_printable() {
            if let Some(decoded) = decode_quoted_printable(self.value) {
                return decoded.trim().to_string();
            }
        }
        self.value.to_string()
    }
}

/// First pass: `item1.X-ABLabel:_$!<Mobile>!$_` becomes `item1 -> Mobile`.
fn collect_group_labels(lines: &[String]) -> GroupLabels {
    lines
        .iter()
        .filter_map(|line| parse_content_line(line))
        .filter(|content| content.name == LABEL_PROPERTY)
        .filter_map(|content| {
            let group = content.group?;
            let label = clean_label(&content.decoded_value());
            (!label.is_empty()).then(|| (group.to_ascii_lowercase(), label))
        })
        .collect()
}

/// Strip the `_$!<` / `>!$_` markers some vendors wrap around stock labels.
fn clean_label(value: &str) -> String {
    value.replace("_$!<", "").replace(">!$_", "").trim().to_string()
}

fn clean_quotes(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse vCard text into contacts in card order.
pub fn parse_vcard(content: &str, options: &ParseOptions) -> Vec<Contact> {
    let cards = card_groups(content);
    let contacts: Vec<Contact> = cards
        .iter()
        .filter_map(|lines| resolve_card(lines, options))
        .collect();

    debug!(
        "event=vcard_parse module=vcard status=ok cards={} contacts={}",
        cards.len(),
        contacts.len()
    );
    contacts
}

fn resolve_card(lines: &[String], options: &ParseOptions) -> Option<Contact> {
    let labels = collect_group_labels(lines);
    let mut builder = ContactBuilder::new();

    for content in lines.iter().filter_map(|line| parse_content_line(line)) {
        if content.name != LABEL_PROPERTY {
            apply_property(&mut builder, &content, &labels, options);
        }
    }

    builder.finish(options.vcard_unnamed)
}

fn apply_property(
    builder: &mut ContactBuilder,
    content: &ContentLine<'_>,
    labels: &GroupLabels,
    options: &ParseOptions,
) {
    let value = content.decoded_value();
    if value.is_empty() {
        return;
    }

    let group_label = content
        .group
        .and_then(|group| labels.get(&group.to_ascii_lowercase()))
        .cloned();
    let resolved_label = || {
        group_label.clone().or_else(|| {
            if content.mentions_whatsapp() {
                Some(WHATSAPP_LABEL.to_string())
            } else {
                content.type_label()
            }
        })
    };

    let name = content.name.as_str();
    match name {
        "FN" => builder.display_name(&unescape_text(&value)),
        "N" => {
            if !builder.has_fallback_name() {
                let name = split_components(&value)
                    .iter()
                    .take(2)
                    .map(|part| part.trim())
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                builder.fallback_name(&name);
            }
        }
        "TEL" => {
            let label = resolved_label().unwrap_or_else(|| DEFAULT_TEL_LABEL.to_string());
            builder.phone(&unescape_text(&value), &label);
        }
        "EMAIL" => {
            let label = resolved_label().unwrap_or_else(|| DEFAULT_EMAIL_LABEL.to_string());
            builder.email(&unescape_text(&value), &label);
        }
        // Components are joined with single spaces; empty ones are not squeezed out.
        "ORG" => builder.organization(&split_components(&value).join(" ")),
        "TITLE" => builder.title(&unescape_text(&value)),
        "NOTE" => builder.note(&unescape_text(&value)),
        "PHOTO" => builder.photo(&value),
        "ADR" => builder.address(&flatten_address(&value)),
        "BDAY" => builder.birthday(&normalize_birthday(&value, options.locale)),
        "ROLE" => builder.extra("Role", &value),
        "URL" => builder.extra(group_label.as_deref().unwrap_or("Website"), &value),
        _ if name.contains("SOCIALPROFILE") => {
            if content.raw.to_ascii_lowercase().contains("whatsapp") {
                if let Some(user) = content.named_param("x-user") {
                    builder.phone(&user, WHATSAPP_LABEL);
                }
            } else {
                let label = group_label
                    .clone()
                    .or_else(|| content.type_label())
                    .unwrap_or_else(|| "Social Profile".to_string());
                builder.extra(&label, &value);
            }
        }
        _ if name.contains("ABDATE") => {
            let label = group_label
                .clone()
                .or_else(|| content.type_label())
                .unwrap_or_else(|| "Date".to_string());
            builder.extra(&label, &value);
        }
        _ if name.starts_with("X-") => builder.extra(&name[2..], &value),
        _ => {}
    }
}

/// Undo vCard text escaping: `\n`/`\N` become newlines, `\,` `\;` `\\`
/// their literal character. Unknown escapes are kept as written.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split a structured value on unescaped `;` and unescape each component.
fn split_components(value: &str) -> Vec<String> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ';' => components.push(unescape_text(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    components.push(unescape_text(&current));
    components
}

fn flatten_address(value: &str) -> String {
    let joined = split_components(value).join(" ");
    collapse_whitespace(&joined.replace('\n', ", "))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_quoted_printable(input: &str) -> Option<String> {
    let mut bytes: Vec<u8> = Vec::with_capacity(input.len());
    let raw = input.as_bytes();
    let mut i = 0usize;

    while i < raw.len() {
        if raw[i] != b'=' {
            bytes.push(raw[i]);
            i += 1;
            continue;
        }
        if i + 1 >= raw.len() {
            // Trailing soft line break
            break;
        }
        if i + 2 >= raw.len() {
            return None;
        }
        let high = (raw[i + 1] as char).to_digit(16)?;
        let low = (raw[i + 2] as char).to_digit(16)?;
        bytes.push(((high << 4) | low) as u8);
        i += 3;
    }

    String::from_utf8(bytes).ok()
}
