//! vCard line unfolding and card splitting.

const BEGIN_VCARD: &str = "begin:vcard";

/// Reverse line folding. A physical line starting with a space or tab continues
/// the previous line; the single fold character is dropped. Quoted-printable
/// soft breaks (`=` at end of line) are joined only on lines that declare that
/// encoding, so base64 padding is never mistaken for a soft break.
pub fn unfold(content: &str) -> String {
    let mut unfolded: Vec<String> = Vec::new();

    for physical in content.split('\n') {
        let line = physical.strip_suffix('\r').unwrap_or(physical);
        let mut handled = false;

        if let Some(last) = unfolded.last_mut() {
            let soft_break = last.ends_with('=') && has_quoted_printable_encoding(last);
            if line.starts_with([' ', '\t']) {
                if soft_break {
                    last.pop();
                }
                last.push_str(&line[1..]);
                handled = true;
            } else if soft_break {
                last.pop();
                last.push_str(line);
                handled = true;
            }
        }

        if !handled {
            unfolded.push(line.to_string());
        }
    }

    unfolded.join("\n")
}

/// Split unfolded text on case-insensitive `BEGIN:VCARD` markers. Material
/// before the first marker is discarded; each card runs to the next marker or
/// end of input, so a missing `END:VCARD` is harmless.
pub fn split_cards(unfolded: &str) -> Vec<Vec<String>> {
    // ASCII lowercasing keeps byte offsets aligned with the original text.
    let lower = unfolded.to_ascii_lowercase();
    let starts: Vec<usize> = lower
        .match_indices(BEGIN_VCARD)
        .map(|(index, _)| index + BEGIN_VCARD.len())
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts
                .get(i + 1)
                .map(|next| next - BEGIN_VCARD.len())
                .unwrap_or(unfolded.len());
            unfolded[start..end]
                .lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Unfold then split: one property-line group per card.
pub fn card_groups(content: &str) -> Vec<Vec<String>> {
    split_cards(&unfold(content))
}

/// True when the parameters before the first colon declare quoted-printable.
pub fn has_quoted_printable_encoding(line: &str) -> bool {
    if let Some((prefix, _)) = line.split_once(':') {
        for part in prefix.split(';').skip(1) {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some((name, value)) = trimmed.split_once('=') {
                if name.trim().eq_ignore_ascii_case("ENCODING")
                    && value.trim().eq_ignore_ascii_case("QUOTED-PRINTABLE")
                {
                    return true;
                }
            } else if trimmed.eq_ignore_ascii_case("QUOTED-PRINTABLE") {
                return true;
            }
        }
    }

    false
}
