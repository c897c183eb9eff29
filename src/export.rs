//! Contact -> vCard text, and the plain-text "copy all" rendering.

use crate::model::Contact;

const CRLF: &str = "\r\n";

/// Serialize a contact as a vCard 3.0 card.
///
/// Labels that are plain tokens go out as `TYPE=`; anything else (spaces,
/// punctuation, WhatsApp) is carried by an `itemN.X-ABLabel` line so it reads
/// back unchanged.
pub fn to_vcard(contact: &Contact) -> String {
    let mut lines: Vec<String> = vec!["BEGIN:VCARD".into(), "VERSION:3.0".into()];
    let mut next_group = 1usize;

    lines.push(format!("FN:{}", escape_text(&contact.display_name)));
    if let Some(org) = &contact.organization {
        lines.push(format!("ORG:{}", escape_text(org).replace(';', "\\;")));
    }
    if let Some(title) = &contact.title {
        lines.push(format!("TITLE:{}", escape_text(title)));
    }
    for phone in &contact.phones {
        push_labelled(&mut lines, &mut next_group, "TEL", &phone.label, &phone.number);
    }
    for email in &contact.emails {
        push_labelled(&mut lines, &mut next_group, "EMAIL", &email.label, &email.address);
    }
    if let Some(address) = &contact.address {
        let street = escape_text(address).replace(';', "\\;").replace(',', "\\,");
        lines.push(format!("ADR;TYPE=HOME:;;{street};;;;"));
    }
    for extra in contact.extras.iter().filter(|e| e.label == "Website") {
        lines.push(format!("URL:{}", extra.value));
    }
    if let Some(note) = &contact.note {
        lines.push(format!("NOTE:{}", escape_text(note)));
    }
    lines.push("END:VCARD".into());

    let mut out = lines.join(CRLF);
    out.push_str(CRLF);
    out
}

fn push_labelled(lines: &mut Vec<String>, next_group: &mut usize, key: &str, label: &str, value: &str) {
    let value = escape_text(value);
    if is_plain_type(label) {
        lines.push(format!("{key};TYPE={label}:{value}"));
    } else {
        let group = format!("item{next_group}");
        *next_group += 1;
        lines.push(format!("{group}.{key}:{value}"));
        lines.push(format!("{group}.X-ABLabel:{label}"));
    }
}

fn is_plain_type(label: &str) -> bool {
    !label.is_empty()
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !label.to_ascii_uppercase().contains("WHATSAPP")
}

/// Backslashes and line breaks escaped so the value stays on one content line.
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}

/// Plain-text block suitable for a clipboard.
pub fn summary_text(contact: &Contact) -> String {
    let mut out = format!(
        "Name: {}\nOrg: {}\n",
        contact.display_name,
        contact.organization.as_deref().unwrap_or("")
    );
    if let Some(title) = &contact.title {
        out.push_str(&format!("Title: {title}\n"));
    }
    for phone in &contact.phones {
        out.push_str(&format!("Phone ({}): {}\n", phone.label, phone.number));
    }
    for email in &contact.emails {
        out.push_str(&format!("Email ({}): {}\n", email.label, email.address));
    }
    if let Some(address) = &contact.address {
        out.push_str(&format!("Address: {address}\n"));
    }
    if let Some(birthday) = &contact.birthday {
        out.push_str(&format!("Birthday: {birthday}\n"));
    }
    for extra in &contact.extras {
        out.push_str(&format!("{}: {}\n", extra.label, extra.value));
    }
    if let Some(note) = &contact.note {
        out.push_str(&format!("Notes: {note}\n"));
    }
    out
}

/// Suggested file name for an exported card.
pub fn file_name(contact: &Contact) -> String {
    let stem: String = contact
        .display_name
        .chars()
        .map(|c| if c.is_whitespace() || matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    let stem = if stem.is_empty() { "contact".to_string() } else { stem };
    format!("{stem}.vcf")
}
