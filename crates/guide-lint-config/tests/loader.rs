use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use guide_lint_config::{
    Config, ConfigError, ConfigSourceKind, IgnoreRules, IssueKind, LoadOptions, Pattern,
};
use tempfile::TempDir;

fn write_file(path: impl AsRef<Path>, contents: &str) {
    let mut file = fs::File::create(path).expect("create config");
    file.write_all(contents.as_bytes()).expect("write config");
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize path")
}

fn pattern_strings<'a, I>(patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Pattern>,
{
    patterns
        .into_iter()
        .map(|p| p.original().to_string())
        .collect()
}

fn languages(config: &Config) -> Vec<&str> {
    config
        .validator
        .allowed_languages
        .iter()
        .map(String::as_str)
        .collect()
}

fn validation_message(err: ConfigError) -> String {
    match err {
        ConfigError::Validation(errors) => errors.to_string(),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn loads_defaults_when_no_files_present() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let config = Config::load(LoadOptions::default().with_working_dir(working_dir.clone()))
        .expect("load defaults");

    assert_eq!(config.project.root, working_dir);
    assert_eq!(
        pattern_strings(config.project.include.iter()),
        vec!["**/*.md".to_string(), "**/*.markdown".to_string()]
    );
    assert_eq!(
        pattern_strings(config.project.exclude.iter()),
        vec!["**/node_modules/**".to_string(), "**/target/**".to_string()]
    );
    assert_eq!(languages(&config), vec!["bash", "sql", "text"]);
    assert_eq!(config.validator.rules, IssueKind::DEFAULT_RULES);
    assert!(config.validator.ignore.is_empty());
    assert_eq!(config.validator.toc.start_marker, "<!-- toc -->");
    assert_eq!(config.validator.toc.end_marker, "<!-- tocstop -->");

    assert_eq!(config.sources.layers.len(), 1);
    assert_eq!(config.sources.layers[0].kind, ConfigSourceKind::Default);
}

#[test]
fn applies_precedence_across_layers() {
    let temp = TempDir::new().expect("tempdir");
    let git_root = canonical(temp.path());
    fs::create_dir(git_root.join(".git")).expect("create .git");

    write_file(
        git_root.join(".guide-lint.toml"),
        r#"
        [project]
        exclude = ["**/build/**"]

        [validator]
        allowed_languages = ["bash", "sql", "text", "psql"]
        rules = ["broken-link", "heading-hierarchy"]

        [[validator.ignore]]
        path = "legacy/**"
        rules = ["*"]
        "#,
    );

    let workspace = git_root.join("workspace");
    fs::create_dir(&workspace).expect("create workspace");

    write_file(
        workspace.join(".guide-lint.toml"),
        r#"
        [validator]
        rules = ["broken-link", "duplicate-anchor", "toc-sync"]
        toc_start_marker = "<!-- table-of-contents -->"
        toc_end_marker = "<!-- /table-of-contents -->"

        [[validator.ignore]]
        path = "drafts/**"
        rules = ["unknown-language"]
        "#,
    );

    let override_path = workspace.join("override.toml");
    write_file(
        &override_path,
        r#"
        [validator]
        toc_headings = ["Index"]
        "#,
    );

    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(&workspace)
            .with_override_path(&override_path),
    )
    .expect("load config with precedence");

    assert_eq!(config.project.root, canonical(&workspace));
    assert_eq!(
        pattern_strings(config.project.exclude.iter()),
        vec!["**/build/**".to_string()]
    );
    assert_eq!(languages(&config), vec!["bash", "psql", "sql", "text"]);
    assert_eq!(
        config.validator.rules,
        vec![
            IssueKind::BrokenLink,
            IssueKind::DuplicateAnchor,
            IssueKind::MissingTocEntry
        ]
    );
    assert_eq!(
        config.validator.toc.start_marker,
        "<!-- table-of-contents -->"
    );
    assert_eq!(config.validator.toc.headings, vec!["Index".to_string()]);

    assert_eq!(config.validator.ignore.len(), 2);
    assert_eq!(config.validator.ignore[0].rules, IgnoreRules::All);
    assert_eq!(
        config.validator.ignore[1].rules,
        IgnoreRules::Specific(vec![IssueKind::UnknownLanguage])
    );

    let kinds: Vec<_> = config
        .sources
        .layers
        .iter()
        .map(|layer| layer.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ConfigSourceKind::Default,
            ConfigSourceKind::GitRoot,
            ConfigSourceKind::Local,
            ConfigSourceKind::Override
        ]
    );
}

#[test]
fn command_line_languages_replace_file_settings() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(".guide-lint.toml"),
        r#"
        [validator]
        allowed_languages = ["bash"]
        "#,
    );

    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(&working_dir)
            .with_allowed_languages([" SQL", "Text "]),
    )
    .expect("load config");

    assert_eq!(languages(&config), vec!["sql", "text"]);
    assert_eq!(
        config.sources.layers.last().map(|layer| layer.kind),
        Some(ConfigSourceKind::CommandLine)
    );
}

#[test]
fn ignore_entries_scope_rules_to_paths() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(".guide-lint.toml"),
        r#"
        [[validator.ignore]]
        path = "legacy/**"
        rules = ["unknown-language", "untagged-code-block"]
        "#,
    );

    let config = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect("load config");

    let scoped = config.validator.scoped_to(Path::new("legacy/old.md"));
    assert!(!scoped.is_enabled(IssueKind::UnknownLanguage));
    assert!(!scoped.is_enabled(IssueKind::UntaggedCodeBlock));
    assert!(scoped.is_enabled(IssueKind::BrokenLink));

    let untouched = config.validator.scoped_to(Path::new("docs/guide.md"));
    assert_eq!(untouched.rules, config.validator.rules);
}

#[test]
fn project_scope_honours_include_and_exclude() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(".guide-lint.toml"),
        r#"
        [project]
        include = ["docs/**/*.md"]
        exclude = ["**/drafts/**"]
        "#,
    );

    let config = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect("load config");

    assert!(config.project.is_in_scope(Path::new("docs/postgres.md")));
    assert!(!config.project.is_in_scope(Path::new("docs/drafts/wip.md")));
    assert!(!config.project.is_in_scope(Path::new("README.md")));
}

#[test]
fn unknown_rule_surfaces_validation_error() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(".guide-lint.toml"),
        r#"
        [validator]
        rules = ["broken-link", "spellcheck", "broken-link"]
        "#,
    );

    let err = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect_err("expected validation failure");

    let joined = validation_message(err);
    assert!(
        joined.contains("unknown rule 'spellcheck'"),
        "unexpected error output: {joined}"
    );
    assert!(
        joined.contains("duplicate rule 'broken-link'"),
        "unexpected error output: {joined}"
    );
}

#[test]
fn invalid_languages_and_globs_are_collected_together() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(".guide-lint.toml"),
        r#"
        [project]
        exclude = ["[["]

        [validator]
        allowed_languages = ["shell script"]
        toc_end_marker = "  "
        "#,
    );

    let err = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect_err("expected validation failure");

    let joined = validation_message(err);
    assert!(joined.contains("invalid glob pattern '[['"), "{joined}");
    assert!(joined.contains("invalid language tag 'shell script'"), "{joined}");
    assert!(
        joined.contains("validator.toc_end_marker: marker cannot be empty"),
        "{joined}"
    );
    assert!(joined.contains("local config at"), "{joined}");
}

#[test]
fn empty_language_list_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(".guide-lint.toml"),
        r#"
        [validator]
        allowed_languages = []
        "#,
    );

    let err = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect_err("expected validation failure");
    assert!(validation_message(err).contains("at least one language must be allowed"));
}

#[test]
fn ignore_entries_require_rules() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(".guide-lint.toml"),
        r#"
        [[validator.ignore]]
        path = "docs/**"
        "#,
    );

    let err = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect_err("expected validation failure");
    assert!(validation_message(err).contains("must specify at least one rule"));
}

#[test]
fn missing_override_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let err = Config::load(
        LoadOptions::default()
            .with_working_dir(temp.path())
            .with_override_path("nope.toml"),
    )
    .expect_err("override must exist");
    assert!(matches!(err, ConfigError::OverrideNotFound { .. }));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path().join(".guide-lint.toml"), "[validator\nrules = 3");

    let err = Config::load(LoadOptions::default().with_working_dir(temp.path()))
        .expect_err("expected parse failure");
    assert!(matches!(err, ConfigError::Parse { .. }));
}
