use std::path::Path;

use guide_lint_config::ValidatorSettings;
use guide_lint_format::LintFinding;
use log::debug;
use rayon::prelude::*;

use crate::paths::Target;
use crate::validate::validate;
use crate::OperationError;

/// Lint every target in parallel. Findings are ordered by path, then by the
/// per-document issue order.
pub(crate) fn run(
    settings: &ValidatorSettings,
    targets: &[Target],
) -> Result<Vec<LintFinding>, OperationError> {
    let per_file = targets
        .par_iter()
        .map(|target| process_file(settings, target))
        .collect::<Result<Vec<_>, _>>()?;

    let mut findings: Vec<LintFinding> = per_file.into_iter().flatten().collect();
    findings.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(findings)
}

fn process_file(
    settings: &ValidatorSettings,
    target: &Target,
) -> Result<Vec<LintFinding>, OperationError> {
    let contents =
        std::fs::read_to_string(&target.absolute).map_err(|source| OperationError::Io {
            path: target.absolute.clone(),
            source,
        })?;
    Ok(check_contents(settings, &target.display, &contents))
}

/// Validate one in-memory document under the rules that apply to `path`.
pub(crate) fn check_contents(
    settings: &ValidatorSettings,
    path: &Path,
    contents: &str,
) -> Vec<LintFinding> {
    let scoped = settings.scoped_to(path);
    let doc = guide_lint_parser::parse(contents);
    let issues = validate(&doc, &scoped);
    debug!(
        "{}: {} block(s), {} issue(s)",
        path.display(),
        doc.blocks().len(),
        issues.len()
    );

    issues
        .into_iter()
        .map(|issue| LintFinding {
            path: path.to_path_buf(),
            line: issue.line_number,
            kind: issue.kind,
            message: issue.message,
        })
        .collect()
}
