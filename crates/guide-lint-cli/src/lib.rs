use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use guide_lint_config::{Config, LoadOptions};
use guide_lint_format::{render_outline, LintFormat, OutlineFormat};
use guide_lint_ops::{LintOptions, LintOutcome, OperationError, Operations, ScanOptions, STDIN_PATH};
use log::{debug, LevelFilter};

/// Exit code for configuration and I/O failures.
const EXIT_FAILURE: i32 = 2;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match Config::load(load_options(&cli)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return Ok(EXIT_FAILURE);
        }
    };
    debug!(
        "configuration layers: {:?}",
        config
            .sources
            .layers
            .iter()
            .map(|layer| layer.kind)
            .collect::<Vec<_>>()
    );

    let ops = Operations::new(config);
    let result = match cli.command {
        Command::Check(args) => handle_check(&ops, args),
        Command::Outline(args) => handle_outline(&ops, args),
    };

    match result {
        Ok(code) => Ok(code),
        Err(err) => match err.downcast::<OperationError>() {
            Ok(OperationError::Io { path, source }) => {
                eprintln!("I/O error on {}: {}", path.display(), source);
                Ok(EXIT_FAILURE)
            }
            Ok(OperationError::InvalidInput(message)) => {
                eprintln!("{message}");
                Ok(EXIT_FAILURE)
            }
            Ok(other) => Err(other.into()),
            Err(err) => Err(err),
        },
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let env = env_logger::Env::default().default_filter_or(level.as_str());
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn load_options(cli: &Cli) -> LoadOptions {
    let mut options = LoadOptions::default();
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }
    if let Command::Check(args) = &cli.command {
        if !args.allow_language.is_empty() {
            options = options.with_allowed_languages(args.allow_language.iter().cloned());
        }
    }
    options
}

fn handle_check(ops: &Operations, args: CheckArgs) -> Result<i32> {
    let CheckArgs {
        paths,
        format,
        allow_language: _,
    } = args;

    let format = match format.unwrap_or(FormatValue::Plain) {
        FormatValue::Plain => LintFormat::Plain,
        FormatValue::Json => LintFormat::Json,
    };

    let (stdin_markers, paths): (Vec<PathBuf>, Vec<PathBuf>) =
        paths.into_iter().partition(|path| is_stdin(path));
    let stdin = if stdin_markers.is_empty() {
        None
    } else {
        Some(read_stdin()?)
    };

    let options = LintOptions {
        scan: ScanOptions { paths, stdin },
        format,
    };
    let LintOutcome {
        rendered,
        exit_code,
        ..
    } = ops.lint(options)?;

    emit(&rendered)?;
    Ok(exit_code)
}

fn handle_outline(ops: &Operations, args: OutlineArgs) -> Result<i32> {
    let OutlineArgs { path, format } = args;

    let format = match format.unwrap_or(FormatValue::Plain) {
        FormatValue::Plain => OutlineFormat::Plain,
        FormatValue::Json => OutlineFormat::Json,
    };

    let outline = if is_stdin(&path) {
        ops.outline_str(Path::new(STDIN_PATH), &read_stdin()?)
    } else {
        ops.outline(&path)?
    };

    emit(&render_outline(&outline, format)?)?;
    Ok(0)
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read standard input")?;
    Ok(buffer)
}

fn emit(content: &str) -> Result<()> {
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "guide-lint",
    author,
    version,
    about = "Consistency checker for Markdown reference guides",
    propagate_version = true
)]
struct Cli {
    /// Use this config file on top of the discovered ones
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate Markdown files (`-` reads standard input)
    Check(CheckArgs),
    /// Print headings, anchor slugs and table-of-contents entries
    Outline(OutlineArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Files or directories to check (defaults to the project root)
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
    /// Select output format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
    /// Replace the allowed code block languages
    #[arg(
        long = "allow-language",
        value_name = "LANG",
        value_delimiter = ',',
        env = "GUIDE_LINT_ALLOWED_LANGUAGES"
    )]
    allow_language: Vec<String>,
}

#[derive(Args)]
struct OutlineArgs {
    /// Markdown file to outline (`-` reads standard input)
    #[arg(value_name = "PATH")]
    path: PathBuf,
    /// Select output format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatValue {
    Plain,
    Json,
}
