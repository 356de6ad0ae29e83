//! Multi-root path resolution for component loads.

use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::types::{Resolution, RootKind, SourceFile};

/// One place a relative Loader target may be found at runtime.
#[derive(Debug, Clone)]
pub enum Candidate {
    /// Build-output tree mirroring the source tree under `output_dir`.
    BuildTree {
        /// Build root joined with the module output subpath.
        output_dir: PathBuf,
    },
    /// The referencing file's own directory in the source tree.
    SourceTree,
}

impl Candidate {
    /// Root kind reported when this candidate resolves.
    const fn kind(&self) -> RootKind {
        return match self {
            Candidate::BuildTree { .. } => RootKind::BuildRoot,
            Candidate::SourceTree => RootKind::SourceRoot,
        };
    }

    /// Directory the target is joined onto, or `None` when this candidate
    /// does not apply. A build-tree mirror that does not exist is skipped so a
    /// partially built tree never vouches for a reference.
    fn base_dir(&self, file: &SourceFile) -> Option<PathBuf> {
        return match self {
            Candidate::BuildTree { output_dir } => {
                let mirrored = output_dir.join(file.relative_dir());
                mirrored.is_dir().then_some(mirrored)
            },
            Candidate::SourceTree => Some(file.dir().to_path_buf()),
        };
    }
}

/// Ordered list of candidate roots, tried until one holds the target.
#[derive(Debug, Clone)]
pub struct Resolver {
    /// Build-output directory that archive-addressed targets map onto.
    archive_dir: PathBuf,
    /// Prefix marking a target as archive-addressed.
    archive_prefix: String,
    /// Candidates in priority order.
    candidates: Vec<Candidate>,
}

impl Resolver {
    /// Source tree first, then `<build_root>/<build_subpath>`. Archive-addressed
    /// targets resolve under `<build_root>/<archive_root>` instead.
    pub fn new(build_root: &Path, config: &Config) -> Self {
        return Self {
            archive_dir: build_root.join(&config.archive_root),
            archive_prefix: config.archive_prefix.clone(),
            candidates: vec![
                Candidate::SourceTree,
                Candidate::BuildTree { output_dir: build_root.join(&config.build_subpath) },
            ],
        };
    }

    /// Resolve `target` as written in `file` against each candidate in order.
    /// Only existence is checked.
    pub fn resolve(&self, file: &SourceFile, target: &str) -> Resolution {
        if let Some(archived) = target.strip_prefix(self.archive_prefix.as_str()) {
            return self.resolve_archived(archived);
        }

        for candidate in &self.candidates {
            let Some(base) = candidate.base_dir(file) else {
                tracing::trace!(?candidate, file = %file.relative.display(), "candidate skipped");
                continue;
            };
            let path = normalize_path(&base.join(target));
            if path.exists() {
                tracing::debug!(reference = target, resolved = %path.display(), "resolved");
                return Resolution::Resolved { kind: candidate.kind(), path };
            }
            tracing::trace!(reference = target, tried = %path.display(), "not found");
        }
        return Resolution::Unresolved;
    }

    /// `qrc:/DevDash/Gauges/X.qml` is looked up as `<archive_dir>/DevDash/Gauges/X.qml`.
    fn resolve_archived(&self, archived: &str) -> Resolution {
        let path = normalize_path(&self.archive_dir.join(archived.trim_start_matches('/')));
        if path.exists() {
            tracing::debug!(reference = archived, resolved = %path.display(), "resolved in archive");
            return Resolution::Resolved { kind: RootKind::BuildRoot, path };
        }
        tracing::trace!(reference = archived, tried = %path.display(), "not in archive");
        return Resolution::Unresolved;
    }
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop and never pops
/// past the filesystem root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    components.iter().collect()
}

/// Handle a single path component during normalization.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => match components.last().copied() {
            Some(Component::Normal(_)) => {
                components.pop();
            },
            Some(Component::RootDir | Component::Prefix(_)) => {},
            _ => components.push(component),
        },
        other => components.push(other),
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use std::fs;

    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "Item {}\n").unwrap();
    }

    fn resolver_for(dir: &Path) -> Resolver {
        let mut config = Config::default();
        config.build_subpath = "qml/Mod".to_string();
        Resolver::new(&dir.join("build"), &config)
    }

    #[test]
    fn normalize_collapses_dot_segments() {
        assert_eq!(normalize_path(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize_path(Path::new("../a/../../b")), PathBuf::from("../../b"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn resolves_sibling_in_source_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("Main.qml"));
        touch(&src.join("Sub.qml"));

        let resolver = resolver_for(dir.path());
        let file = SourceFile::read(&src, &src.join("Main.qml")).unwrap();

        assert_eq!(
            resolver.resolve(&file, "Sub.qml"),
            Resolution::Resolved { kind: RootKind::SourceRoot, path: src.join("Sub.qml") }
        );
    }

    #[test]
    fn falls_back_to_mirrored_build_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("build/qml/Mod");
        touch(&src.join("Gauges/Dial.qml"));
        touch(&out.join("Gauges/Generated.qml"));

        let resolver = resolver_for(dir.path());
        let file = SourceFile::read(&src, &src.join("Gauges/Dial.qml")).unwrap();

        assert_eq!(
            resolver.resolve(&file, "./Generated.qml"),
            Resolution::Resolved {
                kind: RootKind::BuildRoot,
                path: out.join("Gauges/Generated.qml"),
            }
        );
    }

    #[test]
    fn missing_mirror_directory_is_not_tried() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("build/qml/Mod");
        touch(&src.join("Gauges/Dial.qml"));
        // Target exists at the mirror root, but the mirrored `Gauges` directory does not.
        touch(&out.join("Other.qml"));

        let resolver = resolver_for(dir.path());
        let file = SourceFile::read(&src, &src.join("Gauges/Dial.qml")).unwrap();

        assert_eq!(resolver.resolve(&file, "../Other.qml"), Resolution::Unresolved);
    }

    #[test]
    fn unresolved_when_nowhere() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("Main.qml"));

        let resolver = resolver_for(dir.path());
        let file = SourceFile::read(&src, &src.join("Main.qml")).unwrap();

        assert_eq!(resolver.resolve(&file, "missing.qml"), Resolution::Unresolved);
    }

    #[test]
    fn archive_target_resolves_under_build_archive_root() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("Main.qml"));
        touch(&dir.path().join("build/qml/Mod/Sub.qml"));

        let resolver = resolver_for(dir.path());
        let file = SourceFile::read(&src, &src.join("Main.qml")).unwrap();

        assert_eq!(
            resolver.resolve(&file, "qrc:/Mod/Sub.qml"),
            Resolution::Resolved {
                kind: RootKind::BuildRoot,
                path: dir.path().join("build/qml/Mod/Sub.qml"),
            }
        );
    }

    #[test]
    fn misspelled_archive_target_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        touch(&src.join("Main.qml"));
        touch(&src.join("Sub.qml"));
        touch(&dir.path().join("build/qml/Mod/Sub.qml"));

        let resolver = resolver_for(dir.path());
        let file = SourceFile::read(&src, &src.join("Main.qml")).unwrap();

        assert_eq!(resolver.resolve(&file, "qrc:/Mod/Sbu.qml"), Resolution::Unresolved);
        assert_eq!(resolver.resolve(&file, "qrc:/Sub.qml"), Resolution::Unresolved);
    }
}
