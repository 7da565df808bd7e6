//! High-level operations behind the guide-lint commands.
//!
//! The pure pieces ([`validate`], [`DocumentValidator`], the TOC helpers) work
//! on a single parsed document. [`Operations`] wraps them with file discovery,
//! parallel execution across files and report rendering.

mod anchors;
mod lint;
mod paths;
mod toc;
mod validate;

use std::path::{Path, PathBuf};

use guide_lint_config::Config;
use guide_lint_format::{
    render_lint, LintFormat, LintReport, OutlineHeading, OutlineReport, OutlineTocEntry,
};
use log::debug;
use thiserror::Error;

pub use anchors::{normalize_anchor_fragment, suggest_anchor};
pub use toc::{anchor_links, locate_sections, toc_entries, AnchorLink, TocEntry, TocSection};
pub use validate::{validate, DocumentValidator, ValidationIssue};

/// Display name used for documents read from standard input.
pub const STDIN_PATH: &str = "<stdin>";

/// Errors surfaced by the lint run. Rule violations are never errors.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    InvalidInput(String),
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

/// Which documents to lint.
#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    /// Files or directories, relative to the working directory. Empty means
    /// the project root.
    pub paths: Vec<PathBuf>,
    /// Document text read from standard input, linted as [`STDIN_PATH`].
    pub stdin: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LintOptions {
    pub scan: ScanOptions,
    pub format: LintFormat,
}

#[derive(Clone, Debug)]
pub struct LintOutcome {
    pub report: LintReport,
    pub rendered: String,
    pub exit_code: i32,
}

/// Operation bundle shared by the CLI commands.
pub struct Operations {
    config: Config,
    validator: DocumentValidator,
}

impl Operations {
    pub fn new(config: Config) -> Self {
        let validator = DocumentValidator::new(config.validator.clone());
        Operations { config, validator }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validator(&self) -> &DocumentValidator {
        &self.validator
    }

    /// Lint the requested files and render the report.
    ///
    /// Exit code is 0 when no issue was found and 1 otherwise.
    pub fn lint(&self, options: LintOptions) -> Result<LintOutcome, OperationError> {
        let LintOptions { scan, format } = options;

        let mut report = LintReport::default();
        if !scan.paths.is_empty() || scan.stdin.is_none() {
            let targets = paths::collect_targets(&self.config, &scan.paths)?;
            report.files_scanned = targets.len();
            report.findings = lint::run(self.validator.settings(), &targets)?;
        }
        if let Some(text) = &scan.stdin {
            report.merge(self.check_str(Path::new(STDIN_PATH), text));
        }

        debug!(
            "lint finished: {} issue(s) across {} file(s)",
            report.issue_count(),
            report.files_scanned
        );

        let rendered = render_lint(&report, format)?;
        let exit_code = if report.is_clean() { 0 } else { 1 };
        Ok(LintOutcome {
            report,
            rendered,
            exit_code,
        })
    }

    /// Validate an in-memory document as if it lived at `path`.
    pub fn check_str(&self, path: &Path, text: &str) -> LintReport {
        LintReport {
            files_scanned: 1,
            findings: lint::check_contents(self.validator.settings(), path, text),
        }
    }

    /// Headings, slugs and table-of-contents entries of one file.
    pub fn outline(&self, path: &Path) -> Result<OutlineReport, OperationError> {
        let absolute = paths::normalize_path(self.config.sources.working_directory.join(path));
        if absolute.is_dir() {
            return Err(OperationError::InvalidInput(format!(
                "outline expects a file, but {} is a directory",
                absolute.display()
            )));
        }

        let contents =
            std::fs::read_to_string(&absolute).map_err(|source| OperationError::Io {
                path: absolute.clone(),
                source,
            })?;
        Ok(self.outline_str(&paths::display_path(&self.config, &absolute), &contents))
    }

    /// Outline of an in-memory document.
    pub fn outline_str(&self, path: &Path, text: &str) -> OutlineReport {
        let doc = self.validator.parse(text);
        let headings = doc
            .headings()
            .map(|heading| OutlineHeading {
                level: heading.level,
                text: heading.text.clone(),
                slug: heading.slug.clone(),
                line: heading.line,
            })
            .collect();
        let toc_entries = toc_entries(&doc, &self.validator.settings().toc)
            .into_iter()
            .map(|entry| OutlineTocEntry {
                text: entry.text,
                anchor: entry.anchor,
                line: entry.line,
            })
            .collect();

        OutlineReport {
            path: path.to_path_buf(),
            headings,
            toc_entries,
        }
    }
}
