//! Verification pass: discover QML files, extract references, resolve them,
//! and collect diagnostics in discovery order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::boundary;
use crate::config::Config;
use crate::error::Error;
use crate::resolver::Resolver;
use crate::scanner::{self, COMPONENT_SUFFIX};
use crate::types::{
    Diagnostic, DiagnosticKind, Reference, ReferenceKind, Resolution, RootKind, Severity,
    SourceFile, relative_to,
};

/// Outcome of one verification pass over a source tree.
#[derive(Debug)]
pub struct Report {
    /// Build-output root that was consulted.
    pub build_root: PathBuf,
    /// Diagnostics in file-then-line discovery order.
    pub diagnostics: Vec<Diagnostic>,
    /// Source root that was scanned.
    pub source_root: PathBuf,
}

impl Report {
    /// True when no diagnostics were produced.
    pub fn is_clean(&self) -> bool {
        return self.diagnostics.is_empty();
    }
}

/// Scan every QML file under `source_root` and verify its references.
///
/// Files are visited in file-name order within each directory, so identical
/// trees always yield identical reports. Per-file problems, unreadable files
/// included, become diagnostics and never stop the scan.
///
/// # Errors
///
/// Returns `Error::SourceRootNotFound` if `source_root` is not a directory.
pub fn run(source_root: &Path, build_root: &Path, config: &Config) -> Result<Report, Error> {
    if !source_root.is_dir() {
        return Err(Error::SourceRootNotFound { path: source_root.to_path_buf() });
    }

    let resolver = Resolver::new(build_root, config);
    let mut diagnostics = Vec::new();
    let mut scanned = 0_usize;

    for entry in WalkDir::new(source_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if let Some(path) = e.path() {
                    let relative = relative_to(source_root, path);
                    diagnostics.extend(walk_error(&relative, path.is_dir(), &e.to_string(), config));
                }
                continue;
            },
        };

        let path = entry.path();
        if !is_qml_file(path) || !path.is_file() {
            continue;
        }

        let relative = relative_to(source_root, path);
        if !config.should_scan(&relative.to_string_lossy()) {
            tracing::debug!(file = %relative.display(), "excluded by config");
            continue;
        }

        scanned = scanned.saturating_add(1);
        match SourceFile::read(source_root, path) {
            Ok(file) => check_file(&file, config, &resolver, &mut diagnostics),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "unreadable source file");
                diagnostics.push(unreadable(relative, "source file", &e.to_string()));
            },
        }
    }

    tracing::debug!(files = scanned, diagnostics = diagnostics.len(), "scan complete");

    return Ok(Report {
        build_root: build_root.to_path_buf(),
        diagnostics,
        source_root: source_root.to_path_buf(),
    });
}

/// Whether a path names a QML component file.
fn is_qml_file(path: &Path) -> bool {
    return path.extension().is_some_and(|ext| ext == COMPONENT_SUFFIX.trim_start_matches('.'));
}

/// Diagnostic for an entry the walk could not read. Directories that cannot
/// hold scanned files, and entries that are not QML files, are skipped.
fn walk_error(relative: &Path, is_dir: bool, reason: &str, config: &Config) -> Option<Diagnostic> {
    let relative_str = relative.to_string_lossy();
    if is_dir {
        return config
            .should_descend(&relative_str)
            .then(|| unreadable(relative.to_path_buf(), "directory", reason));
    }
    if is_qml_file(relative) && config.should_scan(&relative_str) {
        return Some(unreadable(relative.to_path_buf(), "source file", reason));
    }
    return None;
}

/// Append diagnostics for each reference in a file, in line order.
fn check_file(
    file: &SourceFile,
    config: &Config,
    resolver: &Resolver,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for reference in scanner::extract(&file.content, config) {
        tracing::trace!(file = %file.relative.display(), line = reference.line, reference = %reference.target, "reference");
        match reference.kind {
            ReferenceKind::AssetResource => {
                diagnostics.push(missing_archive_prefix(file, &reference, config));
            },
            ReferenceKind::ComponentLoad => {
                diagnostics.extend(check_component_load(file, &reference, config, resolver));
            },
        }
    }
}

/// Resolve a component load and apply the module boundary check when it
/// resolved in the source tree.
fn check_component_load(
    file: &SourceFile,
    reference: &Reference,
    config: &Config,
    resolver: &Resolver,
) -> Option<Diagnostic> {
    return match resolver.resolve(file, &reference.target) {
        Resolution::Unresolved => Some(unresolved(file, reference)),
        Resolution::Resolved { kind: RootKind::SourceRoot, .. } => {
            boundary::crossed_module(&reference.target, &config.modules)
                .map(|module| cross_module(file, reference, &module.name))
        },
        Resolution::Resolved { kind: RootKind::BuildRoot, .. } => None,
    };
}

// ── Diagnostic construction ───────────────────────────────────────────

/// Component load that resolves under no candidate root.
fn unresolved(file: &SourceFile, reference: &Reference) -> Diagnostic {
    return Diagnostic {
        file: file.relative.clone(),
        hints: Vec::new(),
        kind: DiagnosticKind::UnresolvedReference,
        line: reference.line,
        message: format!("Cannot resolve Loader source: {}", reference.target),
        severity: Severity::Error,
    };
}

/// Asset path without the archive prefix.
fn missing_archive_prefix(file: &SourceFile, reference: &Reference, config: &Config) -> Diagnostic {
    let prefix = &config.archive_prefix;
    let ext = Path::new(&reference.target)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    return Diagnostic {
        file: file.relative.clone(),
        hints: vec![format!("Use: source: \"{prefix}ModulePath/path/to/file.{ext}\"")],
        kind: DiagnosticKind::MissingArchivePrefix,
        line: reference.line,
        message: format!("Resource file should use {prefix} prefix: source: \"{}\"", reference.target),
        severity: Severity::Error,
    };
}

/// Component load that exists on disk but lives in another packaged module.
fn cross_module(file: &SourceFile, reference: &Reference, module: &str) -> Diagnostic {
    return Diagnostic {
        file: file.relative.clone(),
        hints: vec![
            format!("File exists but is in separate QML module ({module})"),
            "Fix: Import the module and use component directly, or restructure modules".to_string(),
        ],
        kind: DiagnosticKind::CrossModuleBoundary,
        line: reference.line,
        message: format!("Cross-module Loader source will fail at runtime: {}", reference.target),
        severity: Severity::Error,
    };
}

/// Source file or directory that could not be read; `what` names which.
fn unreadable(relative: PathBuf, what: &str, reason: &str) -> Diagnostic {
    return Diagnostic {
        file: relative,
        hints: Vec::new(),
        kind: DiagnosticKind::UnreadableFile,
        line: 0,
        message: format!("Cannot read {what}: {reason}"),
        severity: Severity::Error,
    };
}
