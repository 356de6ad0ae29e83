//! Reference extraction: finds `source:` directives in QML text.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::types::{Reference, ReferenceKind};

/// File suffix of a loadable QML component.
pub const COMPONENT_SUFFIX: &str = ".qml";

/// `source: "..."` or `source : '...'`, tolerant of whitespace around the colon.
#[allow(clippy::expect_used, reason = "pattern is a literal")]
static SOURCE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"\bsource\s*:\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex");
});

/// Lazy iterator over the references in one file's text.
///
/// Clones are independent cursors; a clone taken before iteration replays
/// the whole sequence.
#[derive(Clone)]
pub struct References<'a> {
    /// Config providing the archive prefix and asset extensions.
    config: &'a Config,
    /// Remaining lines, numbered from zero.
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    /// References already found on the current line.
    pending: std::vec::IntoIter<Reference>,
}

impl Iterator for References<'_> {
    type Item = Reference;

    fn next(&mut self) -> Option<Reference> {
        loop {
            if let Some(reference) = self.pending.next() {
                return Some(reference);
            }
            let (index, line) = self.lines.next()?;
            let number = u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX);
            self.pending = extract_references_from_line(line, number, self.config).into_iter();
        }
    }
}

/// Extract every component load and unprefixed asset reference from QML text.
pub fn extract<'a>(content: &'a str, config: &'a Config) -> References<'a> {
    return References {
        config,
        lines: content.lines().enumerate(),
        pending: Vec::new().into_iter(),
    };
}

/// Whether a line is a comment line. Block comments are not tracked across lines.
fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    return trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*');
}

/// Extract references from a single line, in column order.
fn extract_references_from_line(line: &str, number: u32, config: &Config) -> Vec<Reference> {
    if is_comment_line(line) {
        return Vec::new();
    }

    SOURCE_DIRECTIVE
        .captures_iter(line)
        .filter_map(|cap| {
            let target = cap.get(1).or_else(|| cap.get(2))?.as_str();
            let kind = classify_target(target, config)?;
            Some(Reference {
                kind,
                line: number,
                target: target.to_string(),
            })
        })
        .collect()
}

/// Decide which reference kind a `source:` target is, if any.
/// Component files are always loads; other targets are flagged only when they
/// carry an asset extension and lack the archive prefix.
fn classify_target(target: &str, config: &Config) -> Option<ReferenceKind> {
    if target.ends_with(COMPONENT_SUFFIX) {
        return Some(ReferenceKind::ComponentLoad);
    }
    if target.starts_with(config.archive_prefix.as_str()) {
        return None;
    }

    let ext = Path::new(target).extension()?.to_str()?.to_ascii_lowercase();
    return config.asset_extensions.contains(&ext).then_some(ReferenceKind::AssetResource);
}
