use super::types::{Finding, Posture, ScanResults, Summary};
use crate::Result;
use chrono::{DateTime, Utc};
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

pub const SUMMARY_JSON: &str = "security_summary.json";
pub const SUMMARY_MARKDOWN: &str = "security_summary.md";

pub fn posture_for(high: usize, medium: usize) -> Posture {
    if high > 0 {
        Posture::NeedsAttention
    } else if medium > 2 {
        Posture::Fair
    } else {
        Posture::Good
    }
}

/// Severity counts come from the static-analysis finding only.
pub fn synthesize_summary(results: &ScanResults) -> Summary {
    let (high, medium) = results
        .findings
        .iter()
        .find_map(|finding| match finding {
            Finding::StaticAnalysis {
                high_severity,
                medium_severity,
                ..
            } => Some((*high_severity, *medium_severity)),
            _ => None,
        })
        .unwrap_or((0, 0));

    let posture = posture_for(high, medium);
    Summary {
        security_posture: posture,
        security_score: posture.score(),
        total_checks: results.checks_performed.len(),
        high_severity_issues: high,
        medium_severity_issues: medium,
        recommendation: posture.recommendation().to_string(),
    }
}

pub fn render_markdown(results: &ScanResults, project: &str, generated_at: DateTime<Utc>) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Security Scan Summary Report\n");
    let _ = writeln!(
        md,
        "**Scan Date:** {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(md, "**Project:** {}\n", project);

    md.push_str("## Overall Security Posture\n\n");
    match &results.summary {
        Some(summary) => {
            let _ = writeln!(md, "**Status:** {}  ", summary.security_posture.as_str());
            let _ = writeln!(md, "**Security Score:** {}/100\n", summary.security_score);
        }
        None => md.push_str("Summary not available.\n\n"),
    }

    md.push_str("## Checks Performed\n\n");
    for check in &results.checks_performed {
        let _ = writeln!(md, "- {}", check);
    }
    md.push('\n');

    md.push_str("## Findings Summary\n\n");
    md.push_str("| Check | Status | Issues Found |\n");
    md.push_str("|-------|--------|-------------|\n");
    for finding in &results.findings {
        let _ = writeln!(
            md,
            "| {} | {} | {} |",
            finding.check_name(),
            finding.status(),
            finding.issues_label()
        );
    }

    let config_issues: Vec<&String> = results
        .findings
        .iter()
        .filter_map(|finding| match finding {
            Finding::Configuration { issues, .. } => Some(issues),
            _ => None,
        })
        .flatten()
        .collect();
    if !config_issues.is_empty() {
        md.push_str("\n## Configuration Issues\n\n");
        for issue in config_issues {
            let _ = writeln!(md, "- {}", issue);
        }
    }

    if let Some(summary) = &results.summary {
        md.push_str("\n## Recommendation\n\n");
        md.push_str(&summary.recommendation);
        md.push('\n');
    }

    md.push_str("\n## Detailed Reports\n\n");
    md.push_str("Full reports are available in the reports directory:\n");
    md.push_str("- `clippy_report.json` - Static analysis diagnostics\n");
    md.push_str("- `cargo_audit.json` - Dependency vulnerability audit\n");
    md.push_str("- `security_summary.json` - Complete scan results\n");

    md
}

/// Writes the machine-readable and human-readable summaries.
pub fn write_reports(
    results: &ScanResults,
    project: &str,
    reports_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(reports_dir)?;

    let json_path = reports_dir.join(SUMMARY_JSON);
    fs::write(&json_path, serde_json::to_string_pretty(results)?)?;

    let md_path = reports_dir.join(SUMMARY_MARKDOWN);
    fs::write(&md_path, render_markdown(results, project, Utc::now()))?;

    Ok((json_path, md_path))
}

pub fn load_results(reports_dir: &Path) -> Result<Option<ScanResults>> {
    let json_path = reports_dir.join(SUMMARY_JSON);
    if !json_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(json_path)?;
    Ok(Some(serde_json::from_str(&content)?))
}
