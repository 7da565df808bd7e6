/// A single input line with its 1-based number. Line terminators (`\n` or
/// `\r\n`) are stripped from `text`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineRecord<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl LineRecord<'_> {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub(crate) fn split_lines(contents: &str) -> Vec<LineRecord<'_>> {
    contents
        .split_inclusive('\n')
        .enumerate()
        .map(|(idx, segment)| {
            let text = segment.strip_suffix('\n').unwrap_or(segment);
            let text = text.strip_suffix('\r').unwrap_or(text);
            LineRecord {
                number: idx + 1,
                text,
            }
        })
        .collect()
}

/// Width of the leading indentation, counting a tab as four columns.
pub(crate) fn leading_indent_width(line: &str) -> usize {
    let mut width = 0usize;
    for ch in line.chars() {
        match ch {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => break,
        }
    }
    width
}
