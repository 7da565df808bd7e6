use guide_lint_config::TocSettings;
use guide_lint_parser::{normalize_heading_text, Block, Document};
use serde::Serialize;

use crate::anchors::normalize_anchor_fragment;

/// Link inside a table of contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub text: String,
    pub anchor: String,
    pub line: usize,
}

/// Inline link whose destination is a `#fragment` in the same document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnchorLink {
    pub label: String,
    pub destination: String,
    /// Percent-decoded, trimmed, lowercased fragment.
    pub fragment: String,
    pub line: usize,
    pub in_toc: bool,
}

/// Lines belonging to a table of contents, exclusive on both ends.
///
/// Opened either by a start marker comment or by a heading whose title is a
/// configured table-of-contents title. `end_line` is `None` when the section
/// runs to the end of the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TocSection {
    pub start_line: usize,
    pub end_line: Option<usize>,
}

impl TocSection {
    pub fn contains(&self, line: usize) -> bool {
        line > self.start_line && self.end_line.map_or(true, |end| line < end)
    }
}

/// Find every table-of-contents section of `doc`, ordered by start line.
pub fn locate_sections(doc: &Document, settings: &TocSettings) -> Vec<TocSection> {
    let mut sections = marker_sections(doc, settings);
    sections.extend(heading_sections(doc, settings));
    sections.sort_by_key(|section| section.start_line);
    sections
}

/// Marker comments sit in paragraph lines. A start marker without a matching
/// end marker opens nothing.
fn marker_sections(doc: &Document, settings: &TocSettings) -> Vec<TocSection> {
    let mut sections = Vec::new();
    let mut open: Option<usize> = None;

    for block in doc.blocks() {
        let Block::Paragraph(paragraph) = block else {
            continue;
        };
        for (offset, text) in paragraph.lines.iter().enumerate() {
            let line = paragraph.line + offset;
            let trimmed = text.trim();
            match open {
                None if trimmed == settings.start_marker => open = Some(line),
                Some(start_line) if trimmed == settings.end_marker => {
                    sections.push(TocSection {
                        start_line,
                        end_line: Some(line),
                    });
                    open = None;
                }
                _ => {}
            }
        }
    }

    sections
}

fn heading_sections(doc: &Document, settings: &TocSettings) -> Vec<TocSection> {
    let headings: Vec<_> = doc.headings().collect();
    headings
        .iter()
        .enumerate()
        .filter(|(_, heading)| settings.is_toc_heading(&normalize_heading_text(&heading.text)))
        .map(|(index, heading)| TocSection {
            start_line: heading.line,
            end_line: headings[index + 1..]
                .iter()
                .find(|next| next.level <= heading.level)
                .map(|next| next.line),
        })
        .collect()
}

/// Every in-document anchor link outside code fences, flagged with whether it
/// sits inside a table of contents. Links with an empty fragment are skipped.
pub fn anchor_links(doc: &Document, settings: &TocSettings) -> Vec<AnchorLink> {
    let sections = locate_sections(doc, settings);
    collect_anchor_links(doc, &sections)
}

pub(crate) fn collect_anchor_links(doc: &Document, sections: &[TocSection]) -> Vec<AnchorLink> {
    doc.links()
        .into_iter()
        .filter_map(|link| {
            let fragment = normalize_anchor_fragment(link.anchor()?);
            if fragment.is_empty() {
                return None;
            }
            Some(AnchorLink {
                in_toc: sections.iter().any(|section| section.contains(link.line)),
                fragment,
                line: link.line,
                label: link.label,
                destination: link.destination,
            })
        })
        .collect()
}

/// Entries of the document's table of contents, in document order.
pub fn toc_entries(doc: &Document, settings: &TocSettings) -> Vec<TocEntry> {
    anchor_links(doc, settings)
        .into_iter()
        .filter(|link| link.in_toc)
        .map(|link| TocEntry {
            text: link.label,
            anchor: link.fragment,
            line: link.line,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use guide_lint_parser::parse;

    #[test]
    fn marker_block_bounds_entries() {
        let doc = parse(
            "# Guide\n\n<!-- toc -->\n- [Setup](#setup)\n<!-- tocstop -->\n\nSee [Setup](#setup).\n\n## Setup\n",
        );
        let sections = locate_sections(&doc, &TocSettings::default());
        assert_eq!(
            sections,
            vec![TocSection {
                start_line: 3,
                end_line: Some(5)
            }]
        );

        let links = anchor_links(&doc, &TocSettings::default());
        assert_eq!(links.len(), 2);
        assert!(links[0].in_toc);
        assert!(!links[1].in_toc);
    }

    #[test]
    fn unclosed_marker_is_ignored() {
        let doc = parse("<!-- toc -->\n- [Setup](#setup)\n");
        assert!(locate_sections(&doc, &TocSettings::default()).is_empty());
        assert!(toc_entries(&doc, &TocSettings::default()).is_empty());
    }

    #[test]
    fn toc_heading_runs_until_next_sibling() {
        let doc = parse(
            "# Guide\n\n## Contents\n\n- [Roles](#roles)\n\n### Nested\n\n## Roles\n\n- [Guide](#guide)\n",
        );
        let sections = locate_sections(&doc, &TocSettings::default());
        assert_eq!(
            sections,
            vec![TocSection {
                start_line: 3,
                end_line: Some(9)
            }]
        );

        let entries = toc_entries(&doc, &TocSettings::default());
        assert_eq!(
            entries,
            vec![TocEntry {
                text: "Roles".into(),
                anchor: "roles".into(),
                line: 5
            }]
        );
    }

    #[test]
    fn toc_heading_at_end_is_open_ended() {
        let doc = parse("## Table of **Contents**\n\n- [A](#a)\n");
        let section = locate_sections(&doc, &TocSettings::default())[0];
        assert_eq!(section.end_line, None);
        assert!(section.contains(1_000));
        assert!(!section.contains(1));
    }

    #[test]
    fn empty_and_external_fragments_are_not_anchor_links() {
        let doc = parse("[top](#) [site](https://example.com/#a) [x](%23y)\n");
        assert!(anchor_links(&doc, &TocSettings::default()).is_empty());
    }
}
