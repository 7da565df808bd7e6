//! Output formatters for guide-lint reports.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use guide_lint_config::IssueKind;
use serde::Serialize;

/// Output format for `check`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LintFormat {
    #[default]
    Plain,
    Json,
}

/// Output format for `outline`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutlineFormat {
    #[default]
    Plain,
    Json,
}

/// One issue attributed to a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    pub path: PathBuf,
    pub line: usize,
    pub kind: IssueKind,
    pub message: String,
}

/// Findings for a whole lint run, ordered by path then line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LintReport {
    pub files_scanned: usize,
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn issue_count(&self) -> usize {
        self.findings.len()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Absorb another report, keeping findings ordered by path.
    pub fn merge(&mut self, other: LintReport) {
        self.files_scanned += other.files_scanned;
        self.findings.extend(other.findings);
        self.findings.sort_by(|a, b| a.path.cmp(&b.path));
    }

    fn files_with_findings(&self) -> usize {
        self.findings
            .iter()
            .map(|finding| &finding.path)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

#[derive(Serialize)]
struct LintPayload<'a> {
    files_scanned: usize,
    issue_count: usize,
    findings: &'a [LintFinding],
}

/// Render a lint report.
pub fn render_lint(report: &LintReport, format: LintFormat) -> serde_json::Result<String> {
    match format {
        LintFormat::Plain => Ok(render_lint_plain(report)),
        LintFormat::Json => serde_json::to_string_pretty(&LintPayload {
            files_scanned: report.files_scanned,
            issue_count: report.issue_count(),
            findings: &report.findings,
        }),
    }
}

fn render_lint_plain(report: &LintReport) -> String {
    let mut output = String::new();
    for finding in &report.findings {
        let _ = writeln!(
            output,
            "{}:{}: {}: {}",
            finding.path.display(),
            finding.line,
            finding.kind,
            finding.message
        );
    }

    let scanned = plural(report.files_scanned, "file");
    if report.is_clean() {
        let _ = writeln!(output, "No issues found ({scanned} scanned)");
    } else {
        let _ = writeln!(
            output,
            "{} in {} ({scanned} scanned)",
            plural(report.issue_count(), "issue"),
            plural(report.files_with_findings(), "file"),
        );
    }
    output
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Heading listing for a single document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutlineReport {
    pub path: PathBuf,
    pub headings: Vec<OutlineHeading>,
    pub toc_entries: Vec<OutlineTocEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutlineHeading {
    pub level: u8,
    pub text: String,
    pub slug: String,
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutlineTocEntry {
    pub text: String,
    pub anchor: String,
    pub line: usize,
}

/// Render an outline report.
pub fn render_outline(outline: &OutlineReport, format: OutlineFormat) -> serde_json::Result<String> {
    match format {
        OutlineFormat::Plain => Ok(render_outline_plain(outline)),
        OutlineFormat::Json => serde_json::to_string_pretty(outline),
    }
}

fn render_outline_plain(outline: &OutlineReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", outline.path.display());

    if outline.headings.is_empty() {
        let _ = writeln!(output, "  (no headings)");
    }
    for heading in &outline.headings {
        let indent = "  ".repeat(usize::from(heading.level));
        let _ = writeln!(
            output,
            "{indent}{} (#{}) line {}",
            heading.text, heading.slug, heading.line
        );
    }

    if !outline.toc_entries.is_empty() {
        let _ = writeln!(output, "Table of contents:");
        for entry in &outline.toc_entries {
            let _ = writeln!(
                output,
                "  {} -> #{} line {}",
                entry.text, entry.anchor, entry.line
            );
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn finding(path: &str, line: usize, kind: IssueKind, message: &str) -> LintFinding {
        LintFinding {
            path: PathBuf::from(path),
            line,
            kind,
            message: message.to_string(),
        }
    }

    #[test]
    fn plain_lint_lists_findings_and_summary() {
        let report = LintReport {
            files_scanned: 3,
            findings: vec![
                finding("docs/a.md", 4, IssueKind::BrokenLink, "link 'Foo' points to missing anchor '#bar'"),
                finding("docs/a.md", 9, IssueKind::UntaggedCodeBlock, "code block opened with '```' has no language tag"),
                finding("docs/b.md", 1, IssueKind::SkippedHeadingLevel, "heading 'Deep' jumps from level 1 to level 3"),
            ],
        };

        let rendered = render_lint(&report, LintFormat::Plain).unwrap();
        assert_eq!(
            rendered,
            "docs/a.md:4: broken-link: link 'Foo' points to missing anchor '#bar'\n\
             docs/a.md:9: untagged-code-block: code block opened with '```' has no language tag\n\
             docs/b.md:1: heading-hierarchy: heading 'Deep' jumps from level 1 to level 3\n\
             3 issues in 2 files (3 files scanned)\n"
        );
    }

    #[test]
    fn plain_lint_reports_clean_runs() {
        let report = LintReport {
            files_scanned: 1,
            findings: Vec::new(),
        };
        assert_eq!(
            render_lint(&report, LintFormat::Plain).unwrap(),
            "No issues found (1 file scanned)\n"
        );
    }

    #[test]
    fn json_lint_uses_rule_names() {
        let report = LintReport {
            files_scanned: 1,
            findings: vec![finding("guide.md", 2, IssueKind::MissingTocEntry, "missing")],
        };
        let rendered = render_lint(&report, LintFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["files_scanned"], 1);
        assert_eq!(value["issue_count"], 1);
        assert_eq!(value["findings"][0]["kind"], "toc-sync");
        assert_eq!(value["findings"][0]["path"], "guide.md");
        assert_eq!(value["findings"][0]["line"], 2);
    }

    #[test]
    fn merge_keeps_paths_ordered() {
        let mut report = LintReport {
            files_scanned: 1,
            findings: vec![finding("z.md", 1, IssueKind::BrokenLink, "x")],
        };
        report.merge(LintReport {
            files_scanned: 1,
            findings: vec![finding("a.md", 5, IssueKind::DuplicateAnchor, "y")],
        });
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.findings[0].path, PathBuf::from("a.md"));
    }

    #[test]
    fn plain_outline_indents_by_level() {
        let outline = OutlineReport {
            path: PathBuf::from("guide.md"),
            headings: vec![
                OutlineHeading {
                    level: 1,
                    text: "Guide".into(),
                    slug: "guide".into(),
                    line: 1,
                },
                OutlineHeading {
                    level: 2,
                    text: "Setup".into(),
                    slug: "setup".into(),
                    line: 5,
                },
            ],
            toc_entries: vec![OutlineTocEntry {
                text: "Setup".into(),
                anchor: "setup".into(),
                line: 3,
            }],
        };

        assert_eq!(
            render_outline(&outline, OutlineFormat::Plain).unwrap(),
            "guide.md\n  Guide (#guide) line 1\n    Setup (#setup) line 5\nTable of contents:\n  Setup -> #setup line 3\n"
        );
    }
}
