//! Block-level Markdown scanning for guide-lint.
//!
//! A document is read line by line into a flat sequence of [`Block`] values:
//! headings (with their derived anchor slugs), fenced code blocks, paragraphs
//! and list items. Parsing is a pure function of the input text and the
//! resulting [`Document`] can be rendered back to Markdown with every block
//! on its original line.

mod block;
mod heading;
mod line;
mod scanner;

pub use block::{
    Block, CodeFence, Fence, Heading, HeadingKind, InlineLink, ListItem, Paragraph,
};
pub use heading::{normalize_heading_text, slugify};
pub use scanner::Blocks;

use serde::Serialize;

/// Lazily scan `text` into blocks. Each call starts a fresh scan.
pub fn blocks(text: &str) -> Blocks<'_> {
    Blocks::new(text)
}

/// Parse `text` into a [`Document`].
pub fn parse(text: &str) -> Document {
    Document::parse(text)
}

/// Ordered blocks of one Markdown document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Document {
            blocks: blocks(text).collect(),
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Document { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn headings(&self) -> impl Iterator<Item = &Heading> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Heading(heading) => Some(heading),
            _ => None,
        })
    }

    pub fn code_fences(&self) -> impl Iterator<Item = &CodeFence> {
        self.blocks.iter().filter_map(|block| match block {
            Block::CodeFence(fence) => Some(fence),
            _ => None,
        })
    }

    /// Every inline link outside code fences, in document order.
    pub fn links(&self) -> Vec<InlineLink> {
        self.blocks.iter().flat_map(Block::links).collect()
    }

    /// Serialise the blocks back to Markdown, padding with blank lines so
    /// each block starts on its recorded line.
    pub fn render(&self) -> String {
        let mut output = String::new();
        let mut next_line = 1usize;

        for block in &self.blocks {
            while next_line < block.line() {
                output.push('\n');
                next_line += 1;
            }
            for line in block.source_lines() {
                output.push_str(&line);
                output.push('\n');
                next_line += 1;
            }
        }

        output
    }
}
