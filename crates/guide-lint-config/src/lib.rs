//! Configuration primitives and loader for guide-lint.
//!
//! The loader resolves settings through a precedence stack:
//! command-line overrides → `--config` file → working directory → git root →
//! built-in defaults. Parsed settings are normalised into typed structures so
//! downstream crates can operate without touching raw TOML.

use std::collections::{BTreeSet, HashSet};
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name looked up in the working directory and at the git root.
pub const CONFIG_FILE_NAME: &str = ".guide-lint.toml";

const DEFAULT_LANGUAGES: &[&str] = &["bash", "sql", "text"];
const DEFAULT_INCLUDE: &[&str] = &["**/*.md", "**/*.markdown"];
const DEFAULT_EXCLUDE: &[&str] = &["**/node_modules/**", "**/target/**"];
const DEFAULT_TOC_START: &str = "<!-- toc -->";
const DEFAULT_TOC_END: &str = "<!-- tocstop -->";
const DEFAULT_TOC_HEADINGS: &[&str] = &["Table of Contents", "Contents"];

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub project: ProjectSettings,
    pub validator: ValidatorSettings,
    pub sources: ConfigSources,
}

/// Project-level settings that declare which files get linted.
#[derive(Clone, Debug)]
pub struct ProjectSettings {
    pub root: PathBuf,
    pub include: PatternList,
    pub exclude: PatternList,
}

impl ProjectSettings {
    /// Determine whether a project-relative path falls inside the lint scope.
    pub fn is_in_scope(&self, relative: &Path) -> bool {
        if self.exclude.matches(relative) {
            return false;
        }
        self.include.is_empty() || self.include.matches(relative)
    }
}

/// Settings consumed by the document validator.
#[derive(Clone, Debug)]
pub struct ValidatorSettings {
    pub allowed_languages: BTreeSet<String>,
    pub rules: Vec<IssueKind>,
    pub ignore: Vec<RuleIgnore>,
    pub toc: TocSettings,
}

impl ValidatorSettings {
    pub fn is_enabled(&self, kind: IssueKind) -> bool {
        self.rules.contains(&kind)
    }

    /// Case-insensitive membership test against the allowed language tags.
    pub fn allows_language(&self, tag: &str) -> bool {
        self.allowed_languages.contains(&tag.to_ascii_lowercase())
    }

    /// Copy of these settings with rules suppressed by `[[validator.ignore]]`
    /// entries matching `relative` removed.
    pub fn scoped_to(&self, relative: &Path) -> ValidatorSettings {
        let rules = self
            .rules
            .iter()
            .copied()
            .filter(|rule| !self.ignore.iter().any(|entry| entry.suppresses(*rule, relative)))
            .collect();
        ValidatorSettings {
            rules,
            ..self.clone()
        }
    }
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        ValidatorSettings {
            allowed_languages: DEFAULT_LANGUAGES.iter().map(|tag| tag.to_string()).collect(),
            rules: IssueKind::DEFAULT_RULES.to_vec(),
            ignore: Vec::new(),
            toc: TocSettings::default(),
        }
    }
}

/// How a table of contents is recognised inside a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocSettings {
    pub start_marker: String,
    pub end_marker: String,
    pub headings: Vec<String>,
}

impl TocSettings {
    /// Whether `title` names a table-of-contents heading (ASCII case-insensitive).
    pub fn is_toc_heading(&self, title: &str) -> bool {
        let title = title.trim();
        self.headings
            .iter()
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(title))
    }
}

impl Default for TocSettings {
    fn default() -> Self {
        TocSettings {
            start_marker: DEFAULT_TOC_START.to_string(),
            end_marker: DEFAULT_TOC_END.to_string(),
            headings: DEFAULT_TOC_HEADINGS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

/// Kinds of issue the validator can report.
///
/// Declaration order doubles as the tie-break priority when two issues land
/// on the same line.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    DuplicateAnchor,
    BrokenLink,
    UntaggedCodeBlock,
    UnknownLanguage,
    UnterminatedFence,
    #[serde(rename = "heading-hierarchy")]
    SkippedHeadingLevel,
    #[serde(rename = "toc-sync")]
    MissingTocEntry,
}

impl IssueKind {
    pub const ALL: &'static [IssueKind] = &[
        IssueKind::DuplicateAnchor,
        IssueKind::BrokenLink,
        IssueKind::UntaggedCodeBlock,
        IssueKind::UnknownLanguage,
        IssueKind::UnterminatedFence,
        IssueKind::SkippedHeadingLevel,
        IssueKind::MissingTocEntry,
    ];

    /// Rules enabled when `validator.rules` is not configured.
    pub const DEFAULT_RULES: &'static [IssueKind] = &[
        IssueKind::DuplicateAnchor,
        IssueKind::BrokenLink,
        IssueKind::UntaggedCodeBlock,
        IssueKind::UnknownLanguage,
        IssueKind::UnterminatedFence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::DuplicateAnchor => "duplicate-anchor",
            IssueKind::BrokenLink => "broken-link",
            IssueKind::UntaggedCodeBlock => "untagged-code-block",
            IssueKind::UnknownLanguage => "unknown-language",
            IssueKind::UnterminatedFence => "unterminated-fence",
            IssueKind::SkippedHeadingLevel => "heading-hierarchy",
            IssueKind::MissingTocEntry => "toc-sync",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        IssueKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or(())
    }
}

/// Glob pattern plus its compiled matcher.
#[derive(Clone, Debug)]
pub struct Pattern {
    original: String,
    matcher: GlobMatcher,
}

impl Pattern {
    fn new(source: &ConfigSource, value: String) -> Result<Self, ConfigValidationError> {
        match Glob::new(&value) {
            Ok(glob) => Ok(Pattern {
                matcher: glob.compile_matcher(),
                original: value,
            }),
            Err(err) => Err(ConfigValidationError::new(
                Some(source.clone()),
                format!("invalid glob pattern '{value}': {err}"),
            )),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }
}

/// Ordered list of glob patterns.
#[derive(Clone, Debug, Default)]
pub struct PatternList {
    patterns: Vec<Pattern>,
}

impl PatternList {
    fn new(patterns: Vec<Pattern>) -> Self {
        PatternList { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(path))
    }
}

/// Suppresses rules for files matching a glob.
#[derive(Clone, Debug)]
pub struct RuleIgnore {
    pub path: Pattern,
    pub rules: IgnoreRules,
    pub source: ConfigSource,
}

impl RuleIgnore {
    pub fn suppresses(&self, rule: IssueKind, path: &Path) -> bool {
        if !self.path.is_match(path) {
            return false;
        }
        match &self.rules {
            IgnoreRules::All => true,
            IgnoreRules::Specific(rules) => rules.contains(&rule),
        }
    }
}

/// Target set for ignore entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IgnoreRules {
    All,
    Specific(Vec<IssueKind>),
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// One layer of configuration (defaults, git root, local, override, command line).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn builtin(kind: ConfigSourceKind, base_dir: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
    CommandLine,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
            ConfigSourceKind::CommandLine => "command line",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub allowed_languages: Option<Vec<String>>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Replace the allowed language set, taking precedence over every file layer.
    pub fn with_allowed_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_languages = Some(languages.into_iter().map(Into::into).collect());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::builtin(ConfigSourceKind::Default, working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(&default_source));
        let mut layers = vec![default_source];

        let local_config_path = working_dir.join(CONFIG_FILE_NAME);
        let git_config_path = find_git_root(&working_dir).map(|root| root.join(CONFIG_FILE_NAME));

        if let Some(path) = git_config_path {
            if path.exists() && Some(&path) != override_path.as_ref() && path != local_config_path
            {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(&path, &source)?);
                layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, &source)?);
            layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, &source)?);
            layers.push(source);
        }

        if let Some(languages) = options.allowed_languages {
            let source = ConfigSource::builtin(ConfigSourceKind::CommandLine, working_dir.clone());
            merged.merge(PartialConfig {
                validator: Some(ValidatorPartial {
                    allowed_languages: Some(Located::new(languages, source.clone())),
                    ..ValidatorPartial::default()
                }),
                ..PartialConfig::default()
            });
            layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            project: resolved.project,
            validator: resolved.validator,
            sources: ConfigSources {
                working_directory: working_dir,
                layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn load_layer(path: &Path, source: &ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.into(),
        source: err,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.into(),
        source: err,
    })?;
    Ok(raw.into_partial(source))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn defaults_layer(source: &ConfigSource) -> PartialConfig {
    let located = |value| Located::new(value, source.clone());
    PartialConfig {
        project: Some(ProjectPartial {
            root: Some(Located::new(PathBuf::from("."), source.clone())),
            include: Some(located(strings(DEFAULT_INCLUDE))),
            exclude: Some(located(strings(DEFAULT_EXCLUDE))),
        }),
        validator: Some(ValidatorPartial {
            allowed_languages: Some(located(strings(DEFAULT_LANGUAGES))),
            rules: Some(located(
                IssueKind::DEFAULT_RULES
                    .iter()
                    .map(|rule| rule.as_str().to_string())
                    .collect(),
            )),
            toc_start_marker: Some(Located::new(DEFAULT_TOC_START.into(), source.clone())),
            toc_end_marker: Some(Located::new(DEFAULT_TOC_END.into(), source.clone())),
            toc_headings: Some(located(strings(DEFAULT_TOC_HEADINGS))),
            ignore: Vec::new(),
        }),
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    project: Option<ProjectPartial>,
    validator: Option<ValidatorPartial>,
}

impl PartialConfig {
    fn merge(&mut self, mut other: PartialConfig) {
        if let Some(other_project) = other.project.take() {
            match &mut self.project {
                Some(project) => project.merge(other_project),
                None => self.project = Some(other_project),
            }
        }

        if let Some(other_validator) = other.validator.take() {
            match &mut self.validator {
                Some(validator) => validator.merge(other_validator),
                None => self.validator = Some(other_validator),
            }
        }
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let project_partial = self.project.unwrap_or_default();
        let root = project_partial
            .root
            .as_ref()
            .map(resolve_path)
            .unwrap_or_else(|| PathBuf::from("."));
        let include = compile_patterns(project_partial.include, "project.include", &mut errors);
        let exclude = compile_patterns(project_partial.exclude, "project.exclude", &mut errors);

        let validator_partial = self.validator.unwrap_or_default();
        let allowed_languages = parse_languages(validator_partial.allowed_languages, &mut errors);
        let rules = parse_rules(validator_partial.rules, &mut errors);
        let ignore = parse_ignore_list(validator_partial.ignore, &mut errors);

        let start_marker = required_marker(
            validator_partial.toc_start_marker,
            DEFAULT_TOC_START,
            "validator.toc_start_marker",
            &mut errors,
        );
        let end_marker = required_marker(
            validator_partial.toc_end_marker,
            DEFAULT_TOC_END,
            "validator.toc_end_marker",
            &mut errors,
        );

        let headings = match validator_partial.toc_headings {
            Some(located) => {
                if located.value.iter().any(|title| title.trim().is_empty()) {
                    errors.push(
                        ConfigValidationError::new(
                            Some(located.source.clone()),
                            "table-of-contents titles cannot be empty".into(),
                        )
                        .with_context("validator.toc_headings"),
                    );
                }
                located.value
            }
            None => strings(DEFAULT_TOC_HEADINGS),
        };

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            project: ProjectSettings {
                root,
                include: PatternList::new(include),
                exclude: PatternList::new(exclude),
            },
            validator: ValidatorSettings {
                allowed_languages,
                rules,
                ignore,
                toc: TocSettings {
                    start_marker,
                    end_marker,
                    headings,
                },
            },
        })
    }
}

#[derive(Clone, Debug, Default)]
struct ProjectPartial {
    root: Option<Located<PathBuf>>,
    include: Option<Located<Vec<String>>>,
    exclude: Option<Located<Vec<String>>>,
}

impl ProjectPartial {
    fn merge(&mut self, other: ProjectPartial) {
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.include.is_some() {
            self.include = other.include;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ValidatorPartial {
    allowed_languages: Option<Located<Vec<String>>>,
    rules: Option<Located<Vec<String>>>,
    toc_start_marker: Option<Located<String>>,
    toc_end_marker: Option<Located<String>>,
    toc_headings: Option<Located<Vec<String>>>,
    ignore: Vec<Located<RuleIgnorePartial>>,
}

impl ValidatorPartial {
    fn merge(&mut self, other: ValidatorPartial) {
        if other.allowed_languages.is_some() {
            self.allowed_languages = other.allowed_languages;
        }
        if other.rules.is_some() {
            self.rules = other.rules;
        }
        if other.toc_start_marker.is_some() {
            self.toc_start_marker = other.toc_start_marker;
        }
        if other.toc_end_marker.is_some() {
            self.toc_end_marker = other.toc_end_marker;
        }
        if other.toc_headings.is_some() {
            self.toc_headings = other.toc_headings;
        }
        self.ignore.extend(other.ignore);
    }
}

#[derive(Clone, Debug)]
struct RuleIgnorePartial {
    path: String,
    rules: Vec<String>,
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    project: ProjectSettings,
    validator: ValidatorSettings,
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let joined = if located.value.is_absolute() {
        located.value.clone()
    } else {
        located.source.base_dir.join(&located.value)
    };
    joined
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

fn compile_patterns(
    located: Option<Located<Vec<String>>>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<Pattern> {
    let Some(located) = located else {
        return Vec::new();
    };
    let mut patterns = Vec::new();
    for pattern in located.value {
        match Pattern::new(&located.source, pattern) {
            Ok(compiled) => patterns.push(compiled),
            Err(err) => errors.push(err.with_context(context)),
        }
    }
    patterns
}

fn parse_languages(
    located: Option<Located<Vec<String>>>,
    errors: &mut Vec<ConfigValidationError>,
) -> BTreeSet<String> {
    let Some(located) = located else {
        return DEFAULT_LANGUAGES.iter().map(|tag| tag.to_string()).collect();
    };

    let mut languages = BTreeSet::new();
    for raw in &located.value {
        let tag = raw.trim();
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            errors.push(
                ConfigValidationError::new(
                    Some(located.source.clone()),
                    format!("invalid language tag '{raw}'"),
                )
                .with_context("validator.allowed_languages"),
            );
            continue;
        }
        languages.insert(tag.to_ascii_lowercase());
    }

    if located.value.is_empty() {
        errors.push(
            ConfigValidationError::new(
                Some(located.source.clone()),
                "at least one language must be allowed".into(),
            )
            .with_context("validator.allowed_languages"),
        );
    }
    languages
}

fn parse_rules(
    located: Option<Located<Vec<String>>>,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<IssueKind> {
    let Some(located) = located else {
        return IssueKind::DEFAULT_RULES.to_vec();
    };

    let mut result = Vec::new();
    let mut seen = HashSet::new();
    for rule_name in &located.value {
        match rule_name.parse::<IssueKind>() {
            Ok(rule) => {
                if seen.insert(rule) {
                    result.push(rule);
                } else {
                    errors.push(
                        ConfigValidationError::new(
                            Some(located.source.clone()),
                            format!("duplicate rule '{rule}'"),
                        )
                        .with_context("validator.rules"),
                    );
                }
            }
            Err(()) => errors.push(
                ConfigValidationError::new(
                    Some(located.source.clone()),
                    format!("unknown rule '{rule_name}'"),
                )
                .with_context("validator.rules"),
            ),
        }
    }
    result
}

fn required_marker(
    located: Option<Located<String>>,
    fallback: &str,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> String {
    let Some(located) = located else {
        return fallback.to_string();
    };
    if located.value.trim().is_empty() {
        errors.push(
            ConfigValidationError::new(Some(located.source.clone()), "marker cannot be empty".into())
                .with_context(context),
        );
    }
    located.value.trim().to_string()
}

fn parse_ignore_list(
    entries: Vec<Located<RuleIgnorePartial>>,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<RuleIgnore> {
    let mut result = Vec::new();
    for entry in entries {
        let Located { value, source } = entry;
        let pattern = match Pattern::new(&source, value.path) {
            Ok(pattern) => pattern,
            Err(err) => {
                errors.push(err.with_context("validator.ignore"));
                continue;
            }
        };

        if value.rules.is_empty() {
            errors.push(
                ConfigValidationError::new(
                    Some(source.clone()),
                    format!(
                        "ignore entry for pattern '{}' must specify at least one rule",
                        pattern.original()
                    ),
                )
                .with_context("validator.ignore"),
            );
            continue;
        }

        let mut all_rules = false;
        let mut rules = Vec::new();
        for rule_name in value.rules {
            if rule_name == "*" {
                all_rules = true;
                continue;
            }
            match rule_name.parse::<IssueKind>() {
                Ok(rule) => rules.push(rule),
                Err(()) => errors.push(
                    ConfigValidationError::new(
                        Some(source.clone()),
                        format!(
                            "unknown rule '{}' in ignore entry for pattern '{}'",
                            rule_name,
                            pattern.original()
                        ),
                    )
                    .with_context("validator.ignore"),
                ),
            }
        }

        let rules = if all_rules {
            IgnoreRules::All
        } else if rules.is_empty() {
            continue;
        } else {
            IgnoreRules::Specific(rules)
        };

        result.push(RuleIgnore {
            path: pattern,
            rules,
            source,
        });
    }
    result
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    project: Option<RawProject>,
    #[serde(default)]
    validator: Option<RawValidator>,
}

impl RawConfig {
    fn into_partial(self, source: &ConfigSource) -> PartialConfig {
        PartialConfig {
            project: self.project.map(|project| project.into_partial(source)),
            validator: self.validator.map(|validator| validator.into_partial(source)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProject {
    #[serde(default)]
    root: Option<PathBuf>,
    #[serde(default)]
    include: Option<Vec<String>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

impl RawProject {
    fn into_partial(self, source: &ConfigSource) -> ProjectPartial {
        ProjectPartial {
            root: self.root.map(|value| Located::new(value, source.clone())),
            include: self.include.map(|value| Located::new(value, source.clone())),
            exclude: self.exclude.map(|value| Located::new(value, source.clone())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawValidator {
    #[serde(default)]
    allowed_languages: Option<Vec<String>>,
    #[serde(default)]
    rules: Option<Vec<String>>,
    #[serde(default)]
    toc_start_marker: Option<String>,
    #[serde(default)]
    toc_end_marker: Option<String>,
    #[serde(default)]
    toc_headings: Option<Vec<String>>,
    #[serde(default)]
    ignore: Vec<RawRuleIgnore>,
}

impl RawValidator {
    fn into_partial(self, source: &ConfigSource) -> ValidatorPartial {
        let located = |value| Located::new(value, source.clone());
        ValidatorPartial {
            allowed_languages: self.allowed_languages.map(located),
            rules: self.rules.map(located),
            toc_start_marker: self
                .toc_start_marker
                .map(|value| Located::new(value, source.clone())),
            toc_end_marker: self
                .toc_end_marker
                .map(|value| Located::new(value, source.clone())),
            toc_headings: self.toc_headings.map(located),
            ignore: self
                .ignore
                .into_iter()
                .map(|entry| {
                    Located::new(
                        RuleIgnorePartial {
                            path: entry.path,
                            rules: entry.rules.unwrap_or_default(),
                        },
                        source.clone(),
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRuleIgnore {
    path: String,
    #[serde(default)]
    rules: Option<Vec<String>>,
}
