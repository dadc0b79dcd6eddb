//! ASCII normalization applied to every exported string field.
//!
//! Recipe text transcribed from photos arrives full of typographic quotes,
//! vulgar fraction glyphs and degree signs that break downstream importers.
//! The transform here is idempotent: running it twice gives the same result.

/// Normalize one field value: map typographic glyphs to ASCII spellings,
/// collapse runs of spaces/tabs to a single space (line breaks untouched),
/// and trim surrounding whitespace.
pub fn sanitize_field(raw: &str) -> String {
    let replaced = replace_glyphs(raw);
    collapse_horizontal_whitespace(&replaced).trim().to_string()
}

fn replace_glyphs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00B0}' => out.push_str(" deg "),
            '\u{00BD}' => out.push_str("1/2"),
            '\u{2153}' => out.push_str("1/3"),
            '\u{2154}' => out.push_str("2/3"),
            '\u{00BC}' => out.push_str("1/4"),
            '\u{00BE}' => out.push_str("3/4"),
            '\u{2155}' => out.push_str("1/5"),
            '\u{2156}' => out.push_str("2/5"),
            '\u{2157}' => out.push_str("3/5"),
            '\u{2158}' => out.push_str("4/5"),
            '\u{2159}' => out.push_str("1/6"),
            '\u{215A}' => out.push_str("5/6"),
            '\u{215B}' => out.push_str("1/8"),
            '\u{215C}' => out.push_str("3/8"),
            '\u{215D}' => out.push_str("5/8"),
            '\u{215E}' => out.push_str("7/8"),
            _ => out.push(c),
        }
    }
    out
}

/// Collapse runs of spaces and tabs to a single space. Newlines pass through
/// unchanged so multi-line fields (ingredients, directions) keep their shape.
fn collapse_horizontal_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c == ' ' || c == '\t' {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Title-casing fix-up for shouty titles. The trailing pictographic marker
/// appended during structuring is preserved; the textual part is converted to
/// title case only when it has at least one uppercase letter and no lowercase.
pub fn fix_title_case(title: &str) -> String {
    let (body, marker) = split_trailing_marker(title);
    let has_upper = body.chars().any(|c| c.is_uppercase());
    let has_lower = body.chars().any(|c| c.is_lowercase());
    if has_upper && !has_lower {
        format!("{}{marker}", title_case(body))
    } else {
        title.to_string()
    }
}

/// Split off a single trailing pictographic character (and nothing else).
/// Returns (textual body, marker suffix); marker is empty when absent.
fn split_trailing_marker(title: &str) -> (&str, &str) {
    match title.chars().next_back() {
        Some(c) if is_pictographic(c) => {
            let idx = title.len() - c.len_utf8();
            (&title[..idx], &title[idx..])
        }
        _ => (title, ""),
    }
}

/// Rough emoji check covering the pictographic blocks the structuring stage
/// draws food markers from.
fn is_pictographic(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1FAFF | 0x2600..=0x26FF | 0x2700..=0x27BF
    )
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            out.push(c);
            at_word_start = true;
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Clean a recipe title into a safe filename stem: filesystem-invalid
/// characters and control characters become underscores.
pub fn clean_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().to_string();
    if trimmed.is_empty() {
        "recipe".to_string()
    } else {
        trimmed
    }
}
