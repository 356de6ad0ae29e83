//! Rendering verification reports as text or JSON.

use std::fmt::Write as _;

use crate::error::Error;
use crate::types::{Diagnostic, serialize_path_lossy};
use crate::verify::Report;

/// Width of the `=` rule around the failure banner.
const RULE_WIDTH: usize = 60;

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Structured JSON document on stdout.
    Json,
    /// Human-readable report.
    Text,
}

/// JSON document shape: the report plus a total.
#[derive(serde::Serialize)]
struct JsonReport<'a> {
    /// Build root that was consulted.
    #[serde(serialize_with = "serialize_path_lossy")]
    build_root: &'a std::path::Path,
    /// Every diagnostic in discovery order.
    diagnostics: &'a [Diagnostic],
    /// Source root that was scanned.
    #[serde(serialize_with = "serialize_path_lossy")]
    source_root: &'a std::path::Path,
    /// Number of diagnostics.
    total: usize,
}

/// Render a report in the requested format.
///
/// # Errors
///
/// Returns `Error::Json` if JSON serialization fails.
pub fn render(report: &Report, format: Format) -> Result<String, Error> {
    return match format {
        Format::Json => render_json(report),
        Format::Text => Ok(render_text(report)),
    };
}

/// Pretty JSON, newline-terminated.
fn render_json(report: &Report) -> Result<String, Error> {
    let doc = JsonReport {
        build_root: &report.build_root,
        diagnostics: &report.diagnostics,
        source_root: &report.source_root,
        total: report.diagnostics.len(),
    };
    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    Ok(out)
}

/// Header, then either the success line or the failure banner, every
/// diagnostic, the total and the footer.
fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Checking QML Loader sources in: {}", report.source_root.display());
    let _ = writeln!(out, "Build directory: {}", report.build_root.display());
    out.push('\n');

    if report.is_clean() {
        out.push_str("\u{2713} All QML Loader sources verified successfully\n");
        return out;
    }

    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "{rule}\nQML LOADER VERIFICATION FAILED\n{rule}\n");

    for diagnostic in &report.diagnostics {
        out.push_str(&render_diagnostic(diagnostic));
        out.push('\n');
    }

    let _ = writeln!(out, "Total errors: {}", report.diagnostics.len());
    out.push_str(
        "\n\
These Loader source paths will fail at runtime when loaded from
Qt resources (qrc:/). The files exist on disk but are in separate
QML modules with separate resource files.
",
    );
    out
}

/// `ERROR: <file>:<line>: <message>` plus one `    -> ` line per hint.
pub fn render_diagnostic(diagnostic: &Diagnostic) -> String {
    let mut out = format!(
        "ERROR: {}:{}: {}\n",
        diagnostic.file.display(),
        diagnostic.line,
        diagnostic.message
    );
    for hint in &diagnostic.hints {
        let _ = writeln!(out, "    -> {hint}");
    }
    out
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::types::{DiagnosticKind, Severity};

    fn report(diagnostics: Vec<Diagnostic>) -> Report {
        Report {
            build_root: PathBuf::from("/p/build"),
            diagnostics,
            source_root: PathBuf::from("/p/src"),
        }
    }

    fn cross_module() -> Diagnostic {
        Diagnostic {
            file: PathBuf::from("Gauges/Dial.qml"),
            hints: vec!["first".to_string(), "second".to_string()],
            kind: DiagnosticKind::CrossModuleBoundary,
            line: 3,
            message: "Cross-module Loader source will fail at runtime: ../Primitives/Needle.qml"
                .to_string(),
            severity: Severity::Error,
        }
    }

    #[test]
    fn clean_report_is_single_confirmation() {
        let text = render_text(&report(Vec::new()));
        assert_eq!(
            text,
            "Checking QML Loader sources in: /p/src\nBuild directory: /p/build\n\n\
             \u{2713} All QML Loader sources verified successfully\n"
        );
    }

    #[test]
    fn diagnostic_block_has_indented_hints() {
        assert_eq!(
            render_diagnostic(&cross_module()),
            "ERROR: Gauges/Dial.qml:3: Cross-module Loader source will fail at runtime: \
             ../Primitives/Needle.qml\n    -> first\n    -> second\n"
        );
    }

    #[test]
    fn failure_report_has_banner_count_and_footer() {
        let text = render_text(&report(vec![cross_module()]));
        assert!(text.contains("QML LOADER VERIFICATION FAILED\n"));
        assert!(text.contains(&"=".repeat(60)));
        assert!(text.contains("ERROR: Gauges/Dial.qml:3:"));
        assert!(text.contains("\nTotal errors: 1\n"));
        assert!(text.ends_with("QML modules with separate resource files.\n"));
    }

    #[test]
    fn json_report_carries_kind_and_total() {
        let json = render(&report(vec![cross_module()]), Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["diagnostics"][0]["kind"], "cross_module_boundary");
        assert_eq!(value["diagnostics"][0]["severity"], "error");
        assert_eq!(value["diagnostics"][0]["line"], 3);
    }

    #[cfg(unix)]
    #[test]
    fn json_report_survives_non_utf8_file_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt as _;

        let mut odd = cross_module();
        odd.file = PathBuf::from(OsStr::from_bytes(b"Bad\xff.qml"));
        let json = render(&report(vec![odd, cross_module()]), Format::Json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["diagnostics"][0]["file"], "Bad\u{fffd}.qml");
        assert_eq!(value["diagnostics"][1]["file"], "Gauges/Dial.qml");
    }
}
