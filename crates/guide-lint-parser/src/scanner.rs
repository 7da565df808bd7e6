use crate::block::{Block, CodeFence, Fence, ListItem, Paragraph};
use crate::heading::{detect_atx_heading, detect_setext_heading};
use crate::line::{leading_indent_width, split_lines, LineRecord};

/// Lazy iterator over the blocks of a Markdown document.
///
/// The scanner walks lines in `Normal` mode, switching into fence mode when
/// it meets an opening delimiter and back out on the matching closer.
/// Headings are recognised in `Normal` mode only; a paragraph directly
/// followed by a `===` or `---` underline becomes a setext heading. A fence
/// still open at end of input is yielded with `closed == false`.
///
/// After a list item, fences may be indented up to three columns past the
/// item's content column, so a code block nested in a numbered step is
/// still a fence. Any line indented less than that column ends the item.
#[derive(Clone, Debug)]
pub struct Blocks<'a> {
    lines: Vec<LineRecord<'a>>,
    cursor: usize,
    front_matter_checked: bool,
    list_content: Option<usize>,
}

impl<'a> Blocks<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Blocks {
            lines: split_lines(text),
            cursor: 0,
            front_matter_checked: false,
            list_content: None,
        }
    }

    fn line(&self, index: usize) -> Option<LineRecord<'a>> {
        self.lines.get(index).copied()
    }

    /// YAML front matter: `---` on the first line through `---` or `...`.
    /// Without a closing delimiter the opening `---` is ordinary content.
    fn skip_front_matter(&mut self) {
        self.front_matter_checked = true;
        let Some(first) = self.line(0) else {
            return;
        };
        if first.text.trim() != "---" {
            return;
        }

        let closing = self.lines[1..].iter().position(|line| {
            let trimmed = line.text.trim();
            trimmed == "---" || trimmed == "..."
        });
        if let Some(offset) = closing {
            self.cursor = offset + 2;
        }
    }

    fn fence_indent_limit(&self) -> usize {
        self.list_content.map_or(3, |column| column + 3)
    }

    fn leave_outdented_list(&mut self, line: &LineRecord<'_>) {
        if let Some(column) = self.list_content {
            if leading_indent_width(line.text) < column {
                self.list_content = None;
            }
        }
    }

    fn starts_block(&self, line: &LineRecord<'_>) -> bool {
        line.is_blank()
            || detect_fence_open(line.text, self.fence_indent_limit()).is_some()
            || detect_atx_heading(line).is_some()
            || detect_list_item(line).is_some()
    }

    fn read_fence(
        &mut self,
        opening: LineRecord<'a>,
        fence: Fence,
        info: &str,
        indent_limit: usize,
    ) -> CodeFence {
        let mut lines = Vec::new();
        let mut closed = false;
        self.cursor += 1;

        while let Some(line) = self.line(self.cursor) {
            self.cursor += 1;
            if is_closing_fence(line.text, fence, indent_limit) {
                closed = true;
                break;
            }
            lines.push(line.text.to_string());
        }

        CodeFence {
            language: info.split_whitespace().next().map(str::to_string),
            info: info.to_string(),
            fence,
            lines,
            line: opening.number,
            closed,
        }
    }

    fn read_paragraph(&mut self, first: LineRecord<'a>) -> Block {
        let mut records = vec![first];
        self.cursor += 1;

        while let Some(line) = self.line(self.cursor) {
            if let Some(heading) = detect_setext_heading(&records, &line) {
                self.cursor += 1;
                return Block::Heading(heading);
            }
            if self.starts_block(&line) {
                break;
            }
            records.push(line);
            self.cursor += 1;
        }

        Block::Paragraph(Paragraph {
            lines: records.iter().map(|record| record.text.to_string()).collect(),
            line: first.number,
        })
    }
}

impl Iterator for Blocks<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if !self.front_matter_checked {
            self.skip_front_matter();
        }

        while let Some(line) = self.line(self.cursor) {
            if line.is_blank() {
                self.cursor += 1;
                continue;
            }
            self.leave_outdented_list(&line);

            let indent_limit = self.fence_indent_limit();
            if let Some((fence, info)) = detect_fence_open(line.text, indent_limit) {
                return Some(Block::CodeFence(
                    self.read_fence(line, fence, info, indent_limit),
                ));
            }

            if let Some(heading) = detect_atx_heading(&line) {
                self.cursor += 1;
                return Some(Block::Heading(heading));
            }

            if let Some(item) = detect_list_item(&line) {
                self.list_content = Some(list_content_column(&line, &item));
                self.cursor += 1;
                return Some(Block::ListItem(item));
            }

            return Some(self.read_paragraph(line));
        }

        None
    }
}

/// Opening fence: at most `indent_limit` columns of indent, then three or
/// more backticks or tildes, then an optional info string.
fn detect_fence_open(line: &str, indent_limit: usize) -> Option<(Fence, &str)> {
    if leading_indent_width(line) > indent_limit {
        return None;
    }

    let rest = line.trim_start();
    let marker = rest.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }

    let len = rest.chars().take_while(|ch| *ch == marker).count();
    if len < 3 {
        return None;
    }

    let info = rest[len..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }

    Some((Fence { marker, len }, info))
}

fn is_closing_fence(line: &str, fence: Fence, indent_limit: usize) -> bool {
    if leading_indent_width(line) > indent_limit {
        return false;
    }

    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.chars().all(|ch| ch == fence.marker)
        && trimmed.chars().count() >= fence.len
}

/// Column where a list item's content starts: marker plus one to four
/// spaces. An empty item or wider padding counts a single space.
fn list_content_column(line: &LineRecord<'_>, item: &ListItem) -> usize {
    let after = &line.text[item.indent + item.marker.len()..];
    let spaces = after.chars().take_while(|ch| *ch == ' ').count();
    let padding = if after.trim().is_empty() || spaces == 0 || spaces > 4 {
        1
    } else {
        spaces
    };
    leading_indent_width(line.text) + item.marker.len() + padding
}

fn detect_list_item(line: &LineRecord<'_>) -> Option<ListItem> {
    let indent = line
        .text
        .chars()
        .take_while(|ch| *ch == ' ' || *ch == '\t')
        .count();
    let rest = &line.text[indent..];

    let marker_len = match *rest.as_bytes().first()? {
        b'-' | b'*' | b'+' => 1,
        b'0'..=b'9' => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 9 || !rest[digits..].starts_with(['.', ')']) {
                return None;
            }
            digits + 1
        }
        _ => return None,
    };

    let (marker, after) = rest.split_at(marker_len);
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    Some(ListItem {
        indent,
        marker: marker.to_string(),
        text: after.trim().to_string(),
        line: line.number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> LineRecord<'_> {
        LineRecord { number: 1, text }
    }

    #[test]
    fn fence_open_extracts_info_string() {
        let (fence, info) = detect_fence_open("```sql title=\"users\"", 3).unwrap();
        assert_eq!(fence, Fence { marker: '`', len: 3 });
        assert_eq!(info, "sql title=\"users\"");

        let (fence, info) = detect_fence_open("  ~~~~", 3).unwrap();
        assert_eq!(fence, Fence { marker: '~', len: 4 });
        assert_eq!(info, "");
    }

    #[test]
    fn backtick_info_with_backtick_is_not_a_fence() {
        assert!(detect_fence_open("``` a`b", 3).is_none());
        assert!(detect_fence_open("``not enough", 3).is_none());
        assert!(detect_fence_open("    ```indented", 3).is_none());
    }

    #[test]
    fn closing_fence_must_be_at_least_as_long() {
        let fence = Fence { marker: '`', len: 4 };
        assert!(!is_closing_fence("```", fence, 3));
        assert!(is_closing_fence("`````  ", fence, 3));
        assert!(!is_closing_fence("~~~~", fence, 3));
        assert!(!is_closing_fence("```` sql", fence, 3));
    }

    #[test]
    fn list_items_need_a_space_after_the_marker() {
        let item = detect_list_item(&record("  - [Install](#install)")).unwrap();
        assert_eq!(item.indent, 2);
        assert_eq!(item.marker, "-");
        assert_eq!(item.text, "[Install](#install)");

        let ordered = detect_list_item(&record("12) Restore")).unwrap();
        assert_eq!(ordered.marker, "12)");

        assert!(detect_list_item(&record("---")).is_none());
        assert!(detect_list_item(&record("*bold* text")).is_none());
        assert!(detect_list_item(&record("3.14 is pi")).is_none());
    }

    #[test]
    fn front_matter_is_skipped() {
        let blocks: Vec<_> = Blocks::new("---\ntitle: Guide\n---\n# Start\n").collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line(), 4);
    }

    #[test]
    fn unclosed_front_matter_opener_is_content() {
        let blocks: Vec<_> =
            Blocks::new("---\n\n# Guide\n\n# Guide\n\n```\nunclosed\n").collect();
        assert_eq!(blocks.len(), 4);
        assert!(matches!(&blocks[0], Block::Paragraph(p) if p.line == 1));
        assert!(matches!(&blocks[1], Block::Heading(h) if h.line == 3));
        assert!(matches!(&blocks[2], Block::Heading(h) if h.line == 5));
        assert!(matches!(&blocks[3], Block::CodeFence(f) if f.line == 7 && !f.closed));
    }

    #[test]
    fn setext_underline_takes_the_whole_paragraph() {
        let blocks: Vec<_> = Blocks::new("Intro\nSection\n-------\nbody\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(matches!(
            &blocks[0],
            Block::Heading(h) if h.text == "Intro Section" && h.slug == "intro-section" && h.level == 2 && h.line == 1
        ));
        assert_eq!(blocks[1].line(), 4);
    }

    #[test]
    fn fence_nested_in_list_item_is_recognised() {
        let source = "1. Install the server:\n\n    ```\n    sudo apt install postgresql\n    ```\n\nDone.\n";
        let blocks: Vec<_> = Blocks::new(source).collect();
        assert_eq!(blocks.len(), 3);
        match &blocks[1] {
            Block::CodeFence(fence) => {
                assert_eq!(fence.line, 3);
                assert!(fence.closed);
                assert_eq!(fence.language, None);
                assert_eq!(fence.lines, vec!["    sudo apt install postgresql"]);
            }
            other => panic!("expected a code fence, got {other:?}"),
        }
        assert!(matches!(&blocks[2], Block::Paragraph(p) if p.line == 7));
    }

    #[test]
    fn indented_fence_outside_a_list_stays_text() {
        let blocks: Vec<_> = Blocks::new("Intro\n\n    ```\n    code\n").collect();
        assert!(blocks.iter().all(|block| matches!(block, Block::Paragraph(_))));

        let after_list: Vec<_> =
            Blocks::new("- item\n\nback to prose\n\n    ```\n").collect();
        assert!(matches!(after_list.last(), Some(Block::Paragraph(_))));
    }

    #[test]
    fn list_content_column_counts_marker_and_padding() {
        let item = |text: &str| {
            let line = record(text);
            let parsed = detect_list_item(&line).unwrap();
            list_content_column(&line, &parsed)
        };
        assert_eq!(item("1. Step"), 3);
        assert_eq!(item("  - Nested"), 4);
        assert_eq!(item("10)   Wide"), 6);
        assert_eq!(item("-"), 2);
        assert_eq!(item("-      code"), 2);
    }
}
