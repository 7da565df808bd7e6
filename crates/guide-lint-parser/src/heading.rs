use std::borrow::Cow;

use pulldown_cmark::{Event, Options, Parser};

use crate::block::{Heading, HeadingKind};
use crate::line::{leading_indent_width, LineRecord};

/// Detect an ATX heading (`#` through `######`) on a single line.
pub(crate) fn detect_atx_heading(line: &LineRecord<'_>) -> Option<Heading> {
    if leading_indent_width(line.text) > 3 {
        return None;
    }

    let trimmed_start = line.text.trim_start();
    let pound_count = trimmed_start.chars().take_while(|ch| *ch == '#').count();
    if pound_count == 0 || pound_count > 6 {
        return None;
    }

    let after_hashes = &trimmed_start[pound_count..];
    if !after_hashes.is_empty() && !after_hashes.starts_with(char::is_whitespace) {
        return None;
    }

    let mut content = after_hashes.trim();
    let stripped_hashes = content.trim_end_matches('#');
    if stripped_hashes.len() < content.len() {
        if stripped_hashes.is_empty() {
            content = "";
        } else if stripped_hashes.ends_with(char::is_whitespace) {
            content = stripped_hashes.trim_end();
        }
    }

    Some(build_heading(pound_count as u8, content, line.number, HeadingKind::Atx))
}

/// Detect a setext heading whose text is the paragraph in `text_lines` and
/// whose `===` or `---` underline sits on `underline`. Multi-line text is
/// joined with single spaces.
pub(crate) fn detect_setext_heading(
    text_lines: &[LineRecord<'_>],
    underline: &LineRecord<'_>,
) -> Option<Heading> {
    let first = text_lines.first()?;
    if first.is_blank() || leading_indent_width(first.text) > 3 {
        return None;
    }
    if leading_indent_width(underline.text) > 3 {
        return None;
    }

    let level = match_setext_level(underline.text)?;
    let text = text_lines
        .iter()
        .map(|line| line.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    Some(build_heading(level, &text, first.number, HeadingKind::Setext))
}

fn build_heading(level: u8, text: &str, line: usize, kind: HeadingKind) -> Heading {
    Heading {
        level,
        text: text.to_string(),
        slug: slugify(text),
        line,
        kind,
    }
}

fn match_setext_level(line: &str) -> Option<u8> {
    let trimmed = line.trim();
    let marker = trimmed.chars().next()?;
    if marker != '=' && marker != '-' {
        return None;
    }
    if trimmed.len() < 3 || !trimmed.chars().all(|ch| ch == marker) {
        return None;
    }
    Some(if marker == '=' { 1 } else { 2 })
}

/// Strip inline Markdown (emphasis, code spans, link syntax, HTML) from
/// heading text and collapse runs of whitespace.
pub fn normalize_heading_text(input: &str) -> String {
    let shielded = shield_block_syntax(input.trim());
    let mut text = String::new();

    for event in Parser::new_ext(&shielded, Options::empty()) {
        match event {
            Event::Text(cow) | Event::Code(cow) => text.push_str(&cow),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::FootnoteReference(name) => text.push_str(&name),
            _ => {}
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive the anchor slug for a heading: inline markup removed, lowercased,
/// each space turned into `-`, punctuation other than `-` and `_` dropped.
pub fn slugify(text: &str) -> String {
    let normalized = normalize_heading_text(text);
    let mut slug = String::with_capacity(normalized.len());
    for ch in normalized.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            slug.push(ch);
        } else if ch.is_whitespace() {
            slug.push('-');
        }
    }
    slug
}

/// Heading text is parsed on its own, so a leading `1.`, `- `, `>` or
/// similar would turn it into a list, quote or rule. Escape the first marker
/// so it stays literal text.
fn shield_block_syntax(text: &str) -> Cow<'_, str> {
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &text[digits..];
        if rest.starts_with(['.', ')']) {
            return Cow::Owned(format!("{}\\{}", &text[..digits], rest));
        }
        return Cow::Borrowed(text);
    }

    let mut chars = text.chars();
    let escape = match chars.next() {
        Some('#' | '>' | '`' | '~' | '=') => true,
        Some(marker @ ('-' | '+' | '*')) => {
            let next = chars.next();
            next.map_or(true, char::is_whitespace) || next == Some(marker)
        }
        Some('_') => text.chars().all(|ch| ch == '_' || ch.is_whitespace()),
        _ => false,
    };

    if escape {
        Cow::Owned(format!("\\{text}"))
    } else {
        Cow::Borrowed(text)
    }
}
