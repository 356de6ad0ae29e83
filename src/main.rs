mod boundary;
mod commands;
mod config;
mod error;
mod report;
mod resolver;
mod scanner;
mod types;
mod verify;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::commands::Project;
use crate::report::Format;

#[derive(Parser)]
#[command(
    name = "qmlref",
    version,
    about = "Verify QML Loader sources and qrc:/ resource paths before they fail at runtime"
)]
struct Cli {
    /// Build output directory [default: <root>/build]
    build_dir: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Project root containing `src/` and `.qmlref.toml`
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Log resolution steps to stderr (same as `RUST_LOG=qmlref=debug`)
    #[arg(short, long)]
    verbose: bool,
    /// Re-run on every change under the source or build root
    #[arg(long)]
    watch: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Locate the project, then check once or watch.
///
/// # Errors
///
/// Returns config, source-root, serialization, or watcher errors.
fn run(cli: &Cli) -> Result<ExitCode, error::Error> {
    let project = Project::locate(&cli.root, cli.build_dir.as_deref())?;
    tracing::debug!(
        source_root = %project.source_root.display(),
        build_root = %project.build_root.display(),
        "project located"
    );

    if cli.watch {
        return watch::run(&project, cli.format);
    }
    commands::check(&project, cli.format)
}

/// Log to stderr so stdout carries only the report. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "qmlref=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
