//! Output and reporting
//!
//! Human-readable summaries for the terminal, a plain-text report file, and
//! CSV exports of the findings. CSV rows are one resource per line with the
//! admin edit link and one column per affected field, so a curator can work
//! through the export top to bottom.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::cli::VerbosityLevel;
use crate::engine::{FieldFinding, Severity, ValidationReport};
use crate::error::ValidateError;
use crate::model::ResourceKind;

/// Simple output formatter for human-readable results
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    #[cfg(test)]
    fn plain(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: false,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{color}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn format_report(&self, report: &ValidationReport) -> String {
        let mut output = String::new();

        match self.verbosity {
            VerbosityLevel::Quiet => {
                if report.has_errors() {
                    let _ = writeln!(
                        output,
                        "Errors: {} Invalid items: {} Invalid media: {}",
                        report.error_count(),
                        report.items_invalid,
                        report.media_invalid
                    );
                }
            }
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                output.push_str(&self.format_summary(report));

                for finding in report.errors() {
                    let _ = writeln!(output, "{}", self.format_finding(finding));
                }
                if self.verbosity >= VerbosityLevel::Verbose {
                    for finding in report.warnings() {
                        let _ = writeln!(output, "{}", self.format_finding(finding));
                    }
                    if !report.unexpected_fields.is_empty() {
                        output.push_str("\nUndeclared fields seen:\n");
                        for (name, count) in &report.unexpected_fields {
                            let _ = writeln!(output, "  {name}: {count}");
                        }
                    }
                }
            }
        }

        output
    }

    pub fn format_finding(&self, finding: &FieldFinding) -> String {
        let tag = match finding.severity {
            Severity::Error => self.colorize("✗ ERROR", "31"),
            Severity::Warning => self.colorize("⚠ WARNING", "33"),
        };
        format!("{tag}  {finding}")
    }

    fn format_summary(&self, report: &ValidationReport) -> String {
        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        let _ = writeln!(
            output,
            "  Items:  {} validated, {} {}",
            report.items_validated,
            report.items_invalid,
            self.colorize("invalid", "31")
        );
        let _ = writeln!(
            output,
            "  Media:  {} validated, {} {}",
            report.media_validated,
            report.media_invalid,
            self.colorize("invalid", "31")
        );
        let _ = writeln!(
            output,
            "  {} {}",
            self.colorize("Errors:", "31"),
            report.error_count()
        );
        let _ = writeln!(
            output,
            "  {} {}",
            self.colorize("Warnings:", "33"),
            report.warning_count()
        );
        output
    }

    /// Write the plain-text report, colorless, to `path`.
    pub fn save_report(&self, report: &ValidationReport, path: &Path) -> Result<(), ValidateError> {
        let plain = Output {
            verbosity: VerbosityLevel::Verbose,
            show_colors: false,
        };
        let mut text = format!("Validation report generated at {}\n\n", Utc::now());
        text.push_str(&plain.format_report(report));
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Admin UI link for a resource, derived from the API base URL.
///
/// `resource_path` is the admin route segment (`items` or `media`). A base
/// URL without an `/api` component gets `/admin` appended instead.
pub fn admin_link(base_url: &str, resource_path: &str, id: u64) -> String {
    let admin_base = if base_url.contains("/api") {
        base_url.replace("/api", "/admin")
    } else {
        format!("{}/admin", base_url.trim_end_matches('/'))
    };
    format!("{admin_base}/{resource_path}/{id}")
}

/// Export findings and a summary as CSV files under `dir`.
///
/// Returns the paths written: one findings matrix per resource kind that has
/// findings, plus a summary file.
pub fn export_csv(
    report: &ValidationReport,
    dir: &Path,
    base_url: &str,
) -> Result<Vec<PathBuf>, ValidateError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for (kind, file_name, resource_path) in [
        (ResourceKind::Item, "items_findings.csv", "items"),
        (ResourceKind::Media, "media_findings.csv", "media"),
    ] {
        let csv = findings_matrix(report, kind, base_url, resource_path);
        if let Some(csv) = csv {
            let path = dir.join(file_name);
            std::fs::write(&path, csv)?;
            written.push(path);
        }
    }

    let summary_path = dir.join("summary.csv");
    std::fs::write(&summary_path, summary_csv(report))?;
    written.push(summary_path);

    Ok(written)
}

/// One row per resource with findings, one column per affected field.
/// Returns `None` when the kind has no findings.
fn findings_matrix(
    report: &ValidationReport,
    kind: ResourceKind,
    base_url: &str,
    resource_path: &str,
) -> Option<String> {
    // resource id -> field name -> joined messages
    let mut rows: BTreeMap<u64, BTreeMap<String, Vec<String>>> = BTreeMap::new();
    let mut columns: BTreeSet<String> = BTreeSet::new();

    for finding in &report.findings {
        if finding.resource_kind != kind {
            continue;
        }
        columns.insert(finding.field_name.clone());
        rows.entry(finding.resource_id)
            .or_default()
            .entry(finding.field_name.clone())
            .or_default()
            .push(format!("{}: {}", finding.severity, finding.message));
    }

    if rows.is_empty() {
        return None;
    }

    let mut csv = String::new();
    csv.push_str("id,edit_link");
    for column in &columns {
        let _ = write!(csv, ",{}", csv_escape(column));
    }
    csv.push('\n');

    for (id, fields) in &rows {
        let edit_link = admin_link(base_url, resource_path, *id);
        let _ = write!(csv, "{id},{}", csv_escape(&edit_link));
        for column in &columns {
            let cell = fields
                .get(column)
                .map(|messages| messages.join("; "))
                .unwrap_or_default();
            let _ = write!(csv, ",{}", csv_escape(&cell));
        }
        csv.push('\n');
    }

    Some(csv)
}

fn summary_csv(report: &ValidationReport) -> String {
    let mut csv = String::from("kind,validated,valid,invalid\n");
    let _ = writeln!(
        csv,
        "items,{},{},{}",
        report.items_validated, report.items_valid, report.items_invalid
    );
    let _ = writeln!(
        csv,
        "media,{},{},{}",
        report.media_validated, report.media_valid, report.media_invalid
    );
    csv
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
