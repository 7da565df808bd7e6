use std::collections::{BTreeSet, HashMap, HashSet};

use guide_lint_config::{IssueKind, ValidatorSettings};
use guide_lint_parser::{normalize_heading_text, CodeFence, Document, Heading};
use serde::Serialize;

use crate::anchors::suggest_anchor;
use crate::toc::{collect_anchor_links, locate_sections, AnchorLink, TocSection};

/// A rule violation found in one document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub line_number: usize,
    pub message: String,
}

/// Parses guide text and checks it against a fixed set of validator settings.
///
/// Stateless apart from its settings; one validator can be shared across
/// threads and reused for any number of documents.
#[derive(Clone, Debug, Default)]
pub struct DocumentValidator {
    settings: ValidatorSettings,
}

impl DocumentValidator {
    pub fn new(settings: ValidatorSettings) -> Self {
        DocumentValidator { settings }
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    pub fn parse(&self, text: &str) -> Document {
        guide_lint_parser::parse(text)
    }

    pub fn validate(&self, doc: &Document) -> Vec<ValidationIssue> {
        validate(doc, &self.settings)
    }

    /// Parse and validate in one step.
    pub fn check(&self, text: &str) -> Vec<ValidationIssue> {
        self.validate(&self.parse(text))
    }
}

/// Run every enabled rule over `doc`.
///
/// Issues come back ordered by line, and by [`IssueKind`] priority within a
/// line. Every issue is collected; no rule stops the others.
pub fn validate(doc: &Document, settings: &ValidatorSettings) -> Vec<ValidationIssue> {
    if doc.is_empty() {
        return Vec::new();
    }

    let snapshot = DocumentSnapshot::new(doc, settings);
    let mut issues = Vec::new();
    for &kind in &settings.rules {
        let executor = executor_for(kind);
        issues.extend(
            executor(&snapshot, settings)
                .into_iter()
                .map(|finding| ValidationIssue {
                    kind,
                    line_number: finding.line,
                    message: finding.message,
                }),
        );
    }

    issues.sort_by_key(|issue| (issue.line_number, issue.kind));
    issues
}

type RuleExecutor = fn(&DocumentSnapshot<'_>, &ValidatorSettings) -> Vec<RuleFinding>;

struct RuleFinding {
    line: usize,
    message: String,
}

fn executor_for(kind: IssueKind) -> RuleExecutor {
    match kind {
        IssueKind::DuplicateAnchor => evaluate_duplicate_anchors as RuleExecutor,
        IssueKind::BrokenLink => evaluate_broken_links as RuleExecutor,
        IssueKind::UntaggedCodeBlock => evaluate_untagged_fences as RuleExecutor,
        IssueKind::UnknownLanguage => evaluate_fence_languages as RuleExecutor,
        IssueKind::UnterminatedFence => evaluate_unterminated_fences as RuleExecutor,
        IssueKind::SkippedHeadingLevel => evaluate_heading_hierarchy as RuleExecutor,
        IssueKind::MissingTocEntry => evaluate_toc_sync as RuleExecutor,
    }
}

/// Indexes shared by the rules for a single document.
struct DocumentSnapshot<'a> {
    headings: Vec<&'a Heading>,
    fences: Vec<&'a CodeFence>,
    links: Vec<AnchorLink>,
    toc: Vec<TocSection>,
    slugs: BTreeSet<&'a str>,
}

impl<'a> DocumentSnapshot<'a> {
    fn new(doc: &'a Document, settings: &ValidatorSettings) -> Self {
        let headings: Vec<&Heading> = doc.headings().collect();
        let toc = locate_sections(doc, &settings.toc);
        DocumentSnapshot {
            slugs: headings
                .iter()
                .copied()
                .map(|heading| heading.slug.as_str())
                .filter(|slug| !slug.is_empty())
                .collect(),
            fences: doc.code_fences().collect(),
            links: collect_anchor_links(doc, &toc),
            headings,
            toc,
        }
    }

    fn in_toc(&self, line: usize) -> bool {
        self.toc.iter().any(|section| section.contains(line))
    }
}

fn evaluate_duplicate_anchors(
    snapshot: &DocumentSnapshot<'_>,
    _settings: &ValidatorSettings,
) -> Vec<RuleFinding> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut findings = Vec::new();

    for heading in &snapshot.headings {
        if heading.slug.is_empty() {
            continue;
        }
        let first_line = *first_seen
            .entry(heading.slug.as_str())
            .or_insert(heading.line);
        if first_line != heading.line {
            findings.push(RuleFinding {
                line: heading.line,
                message: format!(
                    "anchor '#{}' of heading '{}' on line {} duplicates the heading on line {}",
                    heading.slug, heading.text, heading.line, first_line
                ),
            });
        }
    }

    findings
}

fn evaluate_broken_links(
    snapshot: &DocumentSnapshot<'_>,
    _settings: &ValidatorSettings,
) -> Vec<RuleFinding> {
    snapshot
        .links
        .iter()
        .filter(|link| !snapshot.slugs.contains(link.fragment.as_str()))
        .map(|link| {
            let mut message = if link.in_toc {
                format!(
                    "table of contents entry '{}' points to missing anchor '#{}'",
                    link.label, link.fragment
                )
            } else {
                format!(
                    "link '{}' points to missing anchor '#{}'",
                    link.label, link.fragment
                )
            };
            if let Some(suggestion) =
                suggest_anchor(&link.fragment, snapshot.slugs.iter().copied())
            {
                message.push_str(&format!(". Did you mean '#{suggestion}'?"));
            }
            RuleFinding {
                line: link.line,
                message,
            }
        })
        .collect()
}

fn evaluate_untagged_fences(
    snapshot: &DocumentSnapshot<'_>,
    _settings: &ValidatorSettings,
) -> Vec<RuleFinding> {
    snapshot
        .fences
        .iter()
        .filter(|fence| fence.language.is_none())
        .map(|fence| RuleFinding {
            line: fence.line,
            message: format!(
                "code block opened with '{}' has no language tag",
                fence.fence.delimiter()
            ),
        })
        .collect()
}

fn evaluate_fence_languages(
    snapshot: &DocumentSnapshot<'_>,
    settings: &ValidatorSettings,
) -> Vec<RuleFinding> {
    snapshot
        .fences
        .iter()
        .filter_map(|fence| {
            let language = fence.language.as_deref()?;
            if settings.allows_language(language) {
                return None;
            }
            let allowed: Vec<&str> = settings
                .allowed_languages
                .iter()
                .map(String::as_str)
                .collect();
            Some(RuleFinding {
                line: fence.line,
                message: format!(
                    "code block language '{}' is not allowed (expected one of: {})",
                    language,
                    allowed.join(", ")
                ),
            })
        })
        .collect()
}

fn evaluate_unterminated_fences(
    snapshot: &DocumentSnapshot<'_>,
    _settings: &ValidatorSettings,
) -> Vec<RuleFinding> {
    snapshot
        .fences
        .iter()
        .filter(|fence| !fence.closed)
        .map(|fence| RuleFinding {
            line: fence.line,
            message: format!(
                "code block opened with '{}' is never closed",
                fence.fence.delimiter()
            ),
        })
        .collect()
}

fn evaluate_heading_hierarchy(
    snapshot: &DocumentSnapshot<'_>,
    _settings: &ValidatorSettings,
) -> Vec<RuleFinding> {
    snapshot
        .headings
        .windows(2)
        .filter(|pair| pair[1].level > pair[0].level + 1)
        .map(|pair| RuleFinding {
            line: pair[1].line,
            message: format!(
                "heading '{}' jumps from level {} to level {}",
                pair[1].text, pair[0].level, pair[1].level
            ),
        })
        .collect()
}

fn evaluate_toc_sync(
    snapshot: &DocumentSnapshot<'_>,
    settings: &ValidatorSettings,
) -> Vec<RuleFinding> {
    if snapshot.toc.is_empty() {
        return Vec::new();
    }

    let listed: HashSet<&str> = snapshot
        .links
        .iter()
        .filter(|link| link.in_toc)
        .map(|link| link.fragment.as_str())
        .collect();

    snapshot
        .headings
        .iter()
        .filter(|heading| heading.level >= 2 && !heading.slug.is_empty())
        .filter(|heading| !snapshot.in_toc(heading.line))
        .filter(|heading| !settings.toc.is_toc_heading(&normalize_heading_text(&heading.text)))
        .filter(|heading| !listed.contains(heading.slug.as_str()))
        .map(|heading| RuleFinding {
            line: heading.line,
            message: format!(
                "heading '{}' (#{}) is missing from the table of contents",
                heading.text, heading.slug
            ),
        })
        .collect()
}
