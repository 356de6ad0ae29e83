/// Core domain types: source files, extracted references, resolutions, diagnostics.
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A QML file discovered under the source root. Content is read once and
/// dropped after its references have been checked.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Raw text, immutable for the scan.
    pub content: String,
    /// Path on disk, under the source root.
    pub path: PathBuf,
    /// Path relative to the source root, used in every diagnostic.
    pub relative: PathBuf,
}

impl SourceFile {
    /// Read a source file found under `root`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read or is not valid UTF-8.
    pub fn read(root: &Path, path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        return Ok(Self {
            content,
            path: path.to_path_buf(),
            relative: relative_to(root, path),
        });
    }

    /// Directory containing the file on disk.
    pub fn dir(&self) -> &Path {
        return self.path.parent().unwrap_or_else(|| Path::new(""));
    }

    /// Directory of the file relative to its root (empty for top-level files).
    pub fn relative_dir(&self) -> &Path {
        return self.relative.parent().unwrap_or_else(|| Path::new(""));
    }
}

/// `path` relative to `root`, or `path` itself when it lies outside `root`.
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    return path.strip_prefix(root).unwrap_or(path).to_path_buf();
}

/// Serialize a path as a string, replacing invalid UTF-8 so one odd file
/// name cannot fail the whole JSON report.
pub fn serialize_path_lossy<S: serde::Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    return serializer.serialize_str(&path.to_string_lossy());
}

/// Which directive produced a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// An asset (`.png`, `.mesh`, ...) assigned to `source:` without the archive prefix.
    AssetResource,
    /// A `source:` assignment that loads another `.qml` component at runtime.
    ComponentLoad,
}

/// One directive found in a QML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Directive kind.
    pub kind: ReferenceKind,
    /// One-based line number in the source file.
    pub line: u32,
    /// Target string exactly as written between the quotes.
    pub target: String,
}

/// The candidate root a reference resolved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Mirrored build-output tree.
    BuildRoot,
    /// Source tree, relative to the referencing file.
    SourceRoot,
}

/// Outcome of resolving a component load against the candidate roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Target exists under the given root at the given path.
    Resolved {
        /// Root the target was found under.
        kind: RootKind,
        /// Normalized path of the existing target.
        path: PathBuf,
    },
    /// No candidate root holds the target.
    Unresolved,
}

/// Severity of a diagnostic. qmlref has no warning tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails the run.
    Error,
}

/// Classification of a diagnostic, stable across releases for JSON consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Component load resolves on disk but lives in a separately packaged module.
    CrossModuleBoundary,
    /// Asset path is not archive-addressed.
    MissingArchivePrefix,
    /// The source file itself could not be read.
    UnreadableFile,
    /// Component load resolves under no candidate root.
    UnresolvedReference,
}

/// One reported problem, carrying enough context to act on without re-running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Source file relative to the source root.
    #[serde(serialize_with = "serialize_path_lossy")]
    pub file: PathBuf,
    /// Remediation lines, rendered as `-> ` lines under the message.
    pub hints: Vec<String>,
    /// Problem classification.
    pub kind: DiagnosticKind,
    /// One-based line number, or 0 when the whole file is affected.
    pub line: u32,
    /// Human-readable description.
    pub message: String,
    /// Always [`Severity::Error`].
    pub severity: Severity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_keeps_content_and_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Gauges/Dial.qml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "Loader { source: \"Needle.qml\" }\n").unwrap();

        let file = SourceFile::read(dir.path(), &path).unwrap();
        assert_eq!(file.content, "Loader { source: \"Needle.qml\" }\n");
        assert_eq!(file.relative, PathBuf::from("Gauges/Dial.qml"));
        assert_eq!(file.relative_dir(), Path::new("Gauges"));
        assert_eq!(file.dir(), dir.path().join("Gauges"));
    }
}
