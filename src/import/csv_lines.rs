//! Logical line reconstruction and field splitting for address-book CSV dumps.
//!
//! A quoted cell may contain raw newlines, so physical lines are accumulated
//! until the buffer holds an even number of double quotes. Cells with an odd
//! number of stray (non-doubled) quotes defeat the heuristic and produce a
//! merged, degraded line.

use log::warn;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Split raw file text into logical CSV lines, dropping blank ones.
pub fn logical_lines(content: &str) -> Vec<String> {
    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);

    let mut lines: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut quotes = 0usize;

    for physical in content.split('\n') {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(physical);
        quotes += physical.matches('"').count();

        if quotes % 2 == 0 {
            if !buffer.trim().is_empty() {
                lines.push(std::mem::take(&mut buffer));
            } else {
                buffer.clear();
            }
            quotes = 0;
        }
    }

    if !buffer.trim().is_empty() {
        warn!(
            "event=csv_lines module=csv status=degraded reason=unbalanced_quotes chars={}",
            buffer.len()
        );
        lines.push(buffer);
    }

    lines
}

/// Split one logical line into cells. Commas inside quotes are literal and
/// `""` inside a quoted cell yields a single `"`.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}
