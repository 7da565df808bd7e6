use std::fs;
use std::path::{Component, Path, PathBuf};

use guide_lint_config::Config;
use log::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::OperationError;

/// A Markdown file selected for linting.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Target {
    /// Path shown in reports and matched against ignore globs.
    pub display: PathBuf,
    pub absolute: PathBuf,
}

/// Expand the requested paths into lint targets.
///
/// With no paths the project root is walked. Directories are walked
/// recursively and filtered by the project include/exclude globs; files named
/// explicitly are always linted.
pub(crate) fn collect_targets(
    config: &Config,
    paths: &[PathBuf],
) -> Result<Vec<Target>, OperationError> {
    let root = &config.project.root;
    let working_dir = &config.sources.working_directory;

    let requested: Vec<PathBuf> = if paths.is_empty() {
        vec![root.clone()]
    } else {
        paths
            .iter()
            .map(|path| normalize_path(working_dir.join(path)))
            .collect()
    };

    let mut targets = Vec::new();
    for absolute in requested {
        let metadata = fs::metadata(&absolute).map_err(|source| OperationError::Io {
            path: absolute.clone(),
            source,
        })?;

        if metadata.is_file() {
            targets.push(target_for(config, absolute));
        } else if metadata.is_dir() {
            walk_directory(config, &absolute, &mut targets);
        } else {
            return Err(OperationError::InvalidInput(format!(
                "{} is neither a file nor a directory",
                absolute.display()
            )));
        }
    }

    targets.sort();
    targets.dedup();
    debug!("collected {} lint target(s)", targets.len());
    Ok(targets)
}

fn walk_directory(config: &Config, dir: &Path, targets: &mut Vec<Target>) {
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable path: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let absolute = entry.into_path();
        let scope_path = absolute
            .strip_prefix(&config.project.root)
            .or_else(|_| absolute.strip_prefix(dir))
            .unwrap_or(&absolute);
        if config.project.is_in_scope(scope_path) {
            targets.push(target_for(config, absolute));
        } else {
            debug!("{} is out of scope", absolute.display());
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

pub(crate) fn target_for(config: &Config, absolute: PathBuf) -> Target {
    Target {
        display: display_path(config, &absolute),
        absolute,
    }
}

/// Project-relative path when possible, else relative to the working directory.
pub(crate) fn display_path(config: &Config, absolute: &Path) -> PathBuf {
    absolute
        .strip_prefix(&config.project.root)
        .or_else(|_| absolute.strip_prefix(&config.sources.working_directory))
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| absolute.to_path_buf())
}

/// Canonicalise `.` and `..` path segments without touching the filesystem.
pub(crate) fn normalize_path(path: PathBuf) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_drops_dot_segments() {
        assert_eq!(
            normalize_path(PathBuf::from("/repo/./docs/../guide.md")),
            PathBuf::from("/repo/guide.md")
        );
    }
}
