//! File watcher: runs `check` on startup, then re-runs on source or build changes.
//!
//! The project root is watched flat so a source or build root created after
//! startup is noticed and attached on the next burst.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};

use crate::commands::{self, Project};
use crate::error;
use crate::report::Format;

/// Debounce delay between filesystem events and re-check.
const DEBOUNCE_MS: u64 = 100;

/// A directory handed to the watcher and how deep it is watched.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WatchTarget {
    dir: PathBuf,
    mode: RecursiveMode,
}

impl WatchTarget {
    fn flat(dir: &Path) -> Self {
        return Self {
            dir: dir.to_path_buf(),
            mode: RecursiveMode::NonRecursive,
        };
    }

    fn tree(dir: &Path) -> Self {
        return Self {
            dir: dir.to_path_buf(),
            mode: RecursiveMode::Recursive,
        };
    }
}

/// What should be watched right now.
///
/// The project root is always watched flat. The source and build roots are
/// watched recursively once they exist; until then their nearest existing
/// ancestor is watched flat.
fn watch_targets(project: &Project) -> Vec<WatchTarget> {
    let mut targets = vec![WatchTarget::flat(&project.root)];

    for dir in [&project.source_root, &project.build_root] {
        let target = if dir.is_dir() {
            WatchTarget::tree(dir)
        } else {
            match dir.ancestors().skip(1).find(|a| a.is_dir()) {
                Some(ancestor) => WatchTarget::flat(ancestor),
                None => continue,
            }
        };
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    return targets;
}

/// Whether any changed path can affect the report: it lies under the source
/// or build root, or is an ancestor one of them is waiting on.
fn touches_project(project: &Project, paths: &[PathBuf]) -> bool {
    return paths.iter().any(|path| {
        [&project.source_root, &project.build_root]
            .into_iter()
            .any(|dir| path.starts_with(dir) || (dir.starts_with(path) && path != &project.root))
    });
}

/// Forward the paths of every create, modify or remove event.
///
/// # Errors
///
/// Returns `Error::Watch` if the platform watcher cannot be started.
fn create_watcher(
    tx: crossbeam_channel::Sender<Vec<PathBuf>>,
) -> Result<RecommendedWatcher, error::Error> {
    let handler = move |res: notify::Result<notify::Event>| match res {
        Ok(event)
            if event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove() =>
        {
            let _ = tx.send(event.paths);
        },
        Ok(_) => {},
        Err(e) => tracing::warn!(error = %e, "watch event dropped"),
    };
    return notify::recommended_watcher(handler).map_err(|e| error::Error::Watch {
        reason: format!("watcher setup failed: {e}"),
    });
}

/// A watcher plus the targets currently attached to it.
struct Watches {
    attached: Vec<WatchTarget>,
    watcher: RecommendedWatcher,
}

impl Watches {
    fn new(watcher: RecommendedWatcher) -> Self {
        return Self {
            attached: Vec::new(),
            watcher,
        };
    }

    /// Detach targets no longer wanted, then attach the new ones.
    ///
    /// # Errors
    ///
    /// Returns `Error::Watch` for the first directory that cannot be watched.
    /// Targets attached before the failure stay attached.
    fn sync(&mut self, wanted: Vec<WatchTarget>) -> Result<(), error::Error> {
        let (kept, stale): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.attached).into_iter().partition(|t| wanted.contains(t));
        self.attached = kept;

        for target in stale {
            // The directory may already be gone, which drops the watch anyway.
            let _ = self.watcher.unwatch(&target.dir);
            tracing::debug!(dir = %target.dir.display(), "unwatched");
        }

        for target in wanted {
            if self.attached.contains(&target) {
                continue;
            }
            self.watcher.watch(&target.dir, target.mode).map_err(|e| error::Error::Watch {
                reason: format!("cannot watch {}: {e}", target.dir.display()),
            })?;
            tracing::debug!(dir = %target.dir.display(), mode = ?target.mode, "watching");
            self.attached.push(target);
        }
        return Ok(());
    }
}

/// Entry point for `--watch`.
///
/// Runs an initial check, then re-checks after every burst of changes that
/// touches the source or build root, until the watcher shuts down. Returns
/// the exit code of the last check.
///
/// # Errors
///
/// Returns errors from the initial check (a missing source root is fatal
/// here too), or `Error::Watch` if the watcher cannot be created or attached.
pub fn run(project: &Project, format: Format) -> Result<ExitCode, error::Error> {
    eprintln!("watch: initial check");
    let mut last_code = commands::check(project, format)?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watches = Watches::new(create_watcher(tx)?);
    watches.sync(watch_targets(project))?;

    let dir_count = watches.attached.len();
    eprintln!("watch: monitoring {dir_count} directories, press Ctrl+C to stop");

    let debounce = Duration::from_millis(DEBOUNCE_MS);
    while let Ok(paths) = rx.recv() {
        let mut relevant = touches_project(project, &paths);
        while let Ok(more) = rx.recv_timeout(debounce) {
            relevant |= touches_project(project, &more);
        }
        if !relevant {
            continue;
        }

        if let Err(e) = watches.sync(watch_targets(project)) {
            tracing::warn!(error = %e, "could not re-attach watches");
        }
        eprintln!("watch: change detected, re-checking...");
        last_code = run_check(project, format);
    }

    return Ok(last_code);
}

/// Run check once and print the result. Fatal errors are reported and the
/// watcher keeps going.
fn run_check(project: &Project, format: Format) -> ExitCode {
    return match commands::check(project, format) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        },
    };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use std::fs;

    use super::*;

    fn project(root: &Path, build_dir: Option<&Path>) -> Project {
        return Project::locate(root, build_dir).unwrap();
    }

    #[test]
    fn existing_roots_are_watched_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();

        assert_eq!(watch_targets(&project(dir.path(), None)), vec![
            WatchTarget::flat(dir.path()),
            WatchTarget::tree(&dir.path().join("src")),
            WatchTarget::tree(&dir.path().join("build")),
        ]);
    }

    #[test]
    fn build_root_created_later_becomes_a_target() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        let project = project(dir.path(), None);

        assert_eq!(watch_targets(&project), vec![
            WatchTarget::flat(dir.path()),
            WatchTarget::tree(&dir.path().join("src")),
        ]);

        fs::create_dir_all(dir.path().join("build/qml")).unwrap();
        assert!(watch_targets(&project).contains(&WatchTarget::tree(&dir.path().join("build"))));
    }

    #[test]
    fn missing_out_of_tree_build_root_waits_on_nearest_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(root.join("src")).unwrap();
        let build = dir.path().join("out/debug");

        let targets = watch_targets(&project(&root, Some(&build)));
        assert_eq!(targets.last(), Some(&WatchTarget::flat(dir.path())));
    }

    #[test]
    fn only_source_and_build_changes_trigger_a_check() {
        let dir = tempfile::tempdir().unwrap();
        let project = project(dir.path(), None);

        assert!(touches_project(&project, &[dir.path().join("src/Main.qml")]));
        assert!(touches_project(&project, &[dir.path().join("build")]));
        assert!(touches_project(&project, &[dir.path().join("build/qml/Mod/X.qml")]));
        assert!(!touches_project(&project, &[dir.path().join("notes.txt")]));
        assert!(!touches_project(&project, &[dir.path().to_path_buf()]));
        assert!(!touches_project(&project, &[]));
    }

    #[test]
    fn sync_attaches_build_root_created_after_startup() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        let project = project(dir.path(), None);

        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut watches = Watches::new(create_watcher(tx).unwrap());
        watches.sync(watch_targets(&project)).unwrap();
        assert_eq!(watches.attached.len(), 2);

        fs::create_dir_all(dir.path().join("build")).unwrap();
        watches.sync(watch_targets(&project)).unwrap();
        assert_eq!(watches.attached, vec![
            WatchTarget::flat(dir.path()),
            WatchTarget::tree(&dir.path().join("src")),
            WatchTarget::tree(&dir.path().join("build")),
        ]);
    }
}
