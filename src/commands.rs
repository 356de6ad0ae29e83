//! Project layout discovery and the check command.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::error::Error;
use crate::report::{self, Format};
use crate::verify;

/// Directory under the project root holding the QML sources.
const SOURCE_DIR: &str = "src";

/// Default build-output directory under the project root.
const BUILD_DIR: &str = "build";

/// Resolved project layout plus its config, fixed for the process lifetime.
pub struct Project {
    /// Build-output root.
    pub build_root: PathBuf,
    /// Loaded `.qmlref.toml`, or defaults.
    pub config: Config,
    /// Absolute project root.
    pub root: PathBuf,
    /// `<root>/src`.
    pub source_root: PathBuf,
}

impl Project {
    /// Locate `src/` under `root` and pick the build root: `build_dir` when
    /// given (relative to the working directory), `<root>/build` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the working directory cannot be determined,
    /// or config loading errors from `.qmlref.toml`.
    pub fn locate(root: &Path, build_dir: Option<&Path>) -> Result<Self, Error> {
        let root = std::path::absolute(root)?;
        let build_root = match build_dir {
            Some(dir) => std::path::absolute(dir)?,
            None => root.join(BUILD_DIR),
        };
        let config = Config::load(&root)?;
        let source_root = root.join(SOURCE_DIR);

        return Ok(Self {
            build_root,
            config,
            root,
            source_root,
        });
    }
}

/// Verify the project once and print the report to stdout.
///
/// Exit code 0 when clean, 1 when any diagnostic was produced.
///
/// # Errors
///
/// Returns `Error::SourceRootNotFound` if `src/` is missing, or
/// `Error::Json` if the JSON report cannot be serialized.
pub fn check(project: &Project, format: Format) -> Result<ExitCode, Error> {
    let report = verify::run(&project.source_root, &project.build_root, &project.config)?;
    print!("{}", report::render(&report, format)?);

    if report.is_clean() {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::FAILURE);
}
