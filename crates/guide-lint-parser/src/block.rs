use pulldown_cmark::{Event, Options, Parser, Tag};
use serde::Serialize;

/// One block-level element of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading(Heading),
    CodeFence(CodeFence),
    Paragraph(Paragraph),
    ListItem(ListItem),
}

impl Block {
    /// 1-based line on which the block starts.
    pub fn line(&self) -> usize {
        match self {
            Block::Heading(heading) => heading.line,
            Block::CodeFence(fence) => fence.line,
            Block::Paragraph(paragraph) => paragraph.line,
            Block::ListItem(item) => item.line,
        }
    }

    /// Inline links found in the block's prose. Code fences never carry links.
    pub fn links(&self) -> Vec<InlineLink> {
        match self {
            Block::Heading(heading) => inline_links(&heading.text, heading.line),
            Block::CodeFence(_) => Vec::new(),
            Block::Paragraph(paragraph) => {
                let source: Vec<&str> = paragraph.lines.iter().map(|l| l.trim_start()).collect();
                inline_links(&source.join("\n"), paragraph.line)
            }
            Block::ListItem(item) => inline_links(&item.text, item.line),
        }
    }

    /// Markdown source lines reproducing the block.
    pub(crate) fn source_lines(&self) -> Vec<String> {
        match self {
            Block::Heading(heading) => heading.source_lines(),
            Block::CodeFence(fence) => fence.source_lines(),
            Block::Paragraph(paragraph) => paragraph.lines.clone(),
            Block::ListItem(item) => vec![item.source_line()],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingKind {
    Atx,
    Setext,
}

/// Section heading plus the anchor slug derived from its text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub slug: String,
    pub line: usize,
    pub kind: HeadingKind,
}

impl Heading {
    fn source_lines(&self) -> Vec<String> {
        match self.kind {
            HeadingKind::Atx => {
                let hashes = "#".repeat(usize::from(self.level));
                let line = if self.text.is_empty() {
                    hashes
                } else if self.text.ends_with('#') {
                    // A trailing `#` would otherwise be read back as a closing sequence.
                    format!("{hashes} {} #", self.text)
                } else {
                    format!("{hashes} {}", self.text)
                };
                vec![line]
            }
            HeadingKind::Setext => {
                let underline = if self.level == 1 { "===" } else { "---" };
                vec![self.text.clone(), underline.to_string()]
            }
        }
    }
}

/// Delimiter run that opened a fenced code block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Fence {
    pub marker: char,
    pub len: usize,
}

impl Fence {
    /// The delimiter run as written, e.g. "```".
    pub fn delimiter(&self) -> String {
        std::iter::repeat(self.marker).take(self.len).collect()
    }
}

/// Fenced code block. `language` is the first word of the info string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CodeFence {
    pub language: Option<String>,
    pub info: String,
    pub fence: Fence,
    pub lines: Vec<String>,
    pub line: usize,
    pub closed: bool,
}

impl CodeFence {
    fn source_lines(&self) -> Vec<String> {
        let delimiter = self.fence.delimiter();
        let mut lines = Vec::with_capacity(self.lines.len() + 2);
        if self.info.is_empty() {
            lines.push(delimiter.clone());
        } else {
            lines.push(format!("{delimiter}{}", self.info));
        }
        lines.extend(self.lines.iter().cloned());
        if self.closed {
            lines.push(delimiter);
        }
        lines
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub lines: Vec<String>,
    pub line: usize,
}

/// Bullet (`-`, `*`, `+`) or ordered (`1.`, `1)`) list entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub indent: usize,
    pub marker: String,
    pub text: String,
    pub line: usize,
}

impl ListItem {
    fn source_line(&self) -> String {
        let indent = " ".repeat(self.indent);
        if self.text.is_empty() {
            format!("{indent}{}", self.marker)
        } else {
            format!("{indent}{} {}", self.marker, self.text)
        }
    }
}

/// Inline `[label](destination)` link with the line it appears on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineLink {
    pub label: String,
    pub destination: String,
    pub line: usize,
}

impl InlineLink {
    /// The raw fragment when the link targets an anchor in the same document.
    pub fn anchor(&self) -> Option<&str> {
        self.destination.trim().strip_prefix('#')
    }
}

fn inline_links(source: &str, first_line: usize) -> Vec<InlineLink> {
    let mut links = Vec::new();
    let mut open: Option<(String, usize, String)> = None;

    for (event, range) in Parser::new_ext(source, Options::all()).into_offset_iter() {
        match event {
            Event::Start(Tag::Link(_, destination, _)) => {
                let line = first_line + source[..range.start].matches('\n').count();
                open = Some((destination.to_string(), line, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, label)) = open.as_mut() {
                    label.push_str(&text);
                }
            }
            Event::End(Tag::Link(..)) => {
                if let Some((destination, line, label)) = open.take() {
                    links.push(InlineLink {
                        label,
                        destination,
                        line,
                    });
                }
            }
            _ => {}
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_links_report_their_own_line() {
        let block = Block::Paragraph(Paragraph {
            lines: vec![
                "Read the [intro](#intro) first,".to_string(),
                "  then [`psql` basics](#psql-basics).".to_string(),
            ],
            line: 7,
        });

        let links = block.links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].line, 7);
        assert_eq!(links[0].anchor(), Some("intro"));
        assert_eq!(links[1].line, 8);
        assert_eq!(links[1].label, "psql basics");
    }

    #[test]
    fn external_links_have_no_anchor() {
        let link = InlineLink {
            label: "docs".into(),
            destination: "https://www.postgresql.org/docs/#x".into(),
            line: 1,
        };
        assert_eq!(link.anchor(), None);
    }

    #[test]
    fn atx_source_keeps_trailing_hash_text() {
        let heading = Heading {
            level: 2,
            text: "C#".into(),
            slug: "c".into(),
            line: 1,
            kind: HeadingKind::Atx,
        };
        assert_eq!(heading.source_lines(), vec!["## C# #".to_string()]);
    }
}
