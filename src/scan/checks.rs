use super::{
    runner::ToolRunner,
    types::{Finding, STATUS_COMPLETED},
};
use crate::{Error, Result, config};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

pub const CLIPPY_REPORT: &str = "clippy_report.json";
pub const AUDIT_REPORT: &str = "cargo_audit.json";

/// Source markers that show a control is wired into the service.
pub const CONTROL_MARKERS: [(&str, &str); 5] = [
    ("Policy Validator", "PolicyValidator"),
    ("Structured Logging", "tracing_subscriber"),
    ("Input Validation", "validator.validate("),
    ("PII Detection", "PiiDetector"),
    ("Toxic Content Filter", "ToxicLanguage"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Counts compiler diagnostics in `cargo clippy --message-format=json` output.
pub fn parse_clippy_output(stdout: &str) -> SeverityCounts {
    let mut counts = SeverityCounts::default();

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(message) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if message["reason"] != "compiler-message" {
            continue;
        }
        match message["message"]["level"].as_str() {
            Some("error") => counts.high += 1,
            Some("warning") => counts.medium += 1,
            Some(_) => counts.low += 1,
            None => {}
        }
    }

    counts
}

/// Reads the vulnerability count from `cargo audit --json` output.
pub fn parse_audit_output(stdout: &str) -> Result<usize> {
    let report: Value = serde_json::from_str(stdout.trim())?;
    let vulnerabilities = &report["vulnerabilities"];

    if let Some(list) = vulnerabilities["list"].as_array() {
        return Ok(list.len());
    }
    vulnerabilities["count"]
        .as_u64()
        .map(|count| count as usize)
        .ok_or_else(|| Error::scan("audit report has no vulnerabilities section"))
}

pub fn static_analysis(
    runner: &dyn ToolRunner,
    project_root: &Path,
    reports_dir: &Path,
) -> Result<Finding> {
    info!("Running static analysis (cargo clippy)...");

    let output = runner.run(
        "cargo",
        &["clippy", "--all-targets", "--message-format=json"],
        project_root,
    )?;

    if output.stdout.trim().is_empty() {
        return Err(Error::scan(format!(
            "clippy produced no output: {}",
            output.stderr.trim()
        )));
    }

    let report_path = reports_dir.join(CLIPPY_REPORT);
    fs::write(&report_path, &output.stdout)?;

    let counts = parse_clippy_output(&output.stdout);
    info!(
        "Static analysis completed. Found {} high, {} medium, {} low severity issues",
        counts.high, counts.medium, counts.low
    );

    Ok(Finding::StaticAnalysis {
        status: STATUS_COMPLETED.to_string(),
        high_severity: counts.high,
        medium_severity: counts.medium,
        low_severity: counts.low,
        total_issues: counts.high + counts.medium + counts.low,
        report_path: report_path.display().to_string(),
    })
}

pub fn dependency_audit(
    runner: &dyn ToolRunner,
    project_root: &Path,
    reports_dir: &Path,
) -> Result<Finding> {
    info!("Checking dependencies for vulnerabilities (cargo audit)...");

    let output = runner.run("cargo", &["audit", "--json"], project_root)?;

    // cargo audit exits non-zero when it finds vulnerabilities, so only the
    // output decides success.
    let vulnerabilities_found = parse_audit_output(&output.stdout).map_err(|e| {
        Error::scan(format!(
            "cargo audit unavailable or failed ({}): {}",
            e,
            output.stderr.trim()
        ))
    })?;

    let report_path = reports_dir.join(AUDIT_REPORT);
    fs::write(&report_path, &output.stdout)?;

    info!(
        "Dependency check completed. Found {} vulnerabilities",
        vulnerabilities_found
    );

    Ok(Finding::DependencyAudit {
        status: STATUS_COMPLETED.to_string(),
        vulnerabilities_found,
        report_path: report_path.display().to_string(),
    })
}

pub fn configuration_audit(project_root: &Path, config_path: &Path) -> Result<Finding> {
    info!("Validating service configuration...");

    let mut issues = Vec::new();

    if project_root.join(".env").exists() {
        debug!(".env file found");
    } else {
        issues.push("Missing .env file - API keys may be exposed".to_string());
    }

    let gitignore = project_root.join(".gitignore");
    if gitignore.exists() {
        let content = fs::read_to_string(&gitignore)?;
        if content.lines().any(|line| line.trim().starts_with(".env")) {
            debug!(".env is in .gitignore");
        } else {
            issues.push(".env not in .gitignore - credentials at risk".to_string());
        }
    } else {
        issues.push("Missing .gitignore file".to_string());
    }

    if config_path.exists() {
        let content = fs::read_to_string(config_path)?;
        match config::from_yaml_str(&content) {
            Ok(service_config) => {
                let level = service_config.server.logs.level.to_ascii_lowercase();
                if level == "debug" || level == "trace" {
                    issues.push("Verbose logging enabled - unsafe for production".to_string());
                }
                if !service_config.llm.api_key.trim().is_empty() {
                    issues.push(
                        "API key stored in config file - use OPENAI_API_KEY instead".to_string(),
                    );
                }
                if service_config.server.expose_error_details {
                    issues.push(
                        "Provider error details exposed to callers - disable expose_error_details"
                            .to_string(),
                    );
                }
            }
            Err(e) => {
                warn!("Could not parse {}: {}", config_path.display(), e);
                issues.push(format!(
                    "Service configuration {} could not be parsed",
                    config_path.display()
                ));
            }
        }
    } else {
        debug!("No service configuration at {}", config_path.display());
    }

    if issues.is_empty() {
        info!("Configuration validation passed");
    } else {
        warn!("Configuration check found {} issues", issues.len());
    }

    Ok(Finding::Configuration {
        status: STATUS_COMPLETED.to_string(),
        issues_found: issues.len(),
        issues,
    })
}

pub fn control_audit(project_root: &Path) -> Result<Finding> {
    info!("Checking security controls...");

    let src_dir = project_root.join("src");
    if !src_dir.is_dir() {
        return Err(Error::scan(format!(
            "source directory {} not found",
            src_dir.display()
        )));
    }

    let mut sources = Vec::new();
    collect_rust_files(&src_dir, &mut sources)?;

    let mut contents = String::new();
    for path in &sources {
        contents.push_str(&fs::read_to_string(path)?);
        contents.push('\n');
    }

    let details: BTreeMap<String, bool> = CONTROL_MARKERS
        .iter()
        .map(|(control, marker)| (control.to_string(), contents.contains(marker)))
        .collect();
    let controls_enabled = details.values().filter(|enabled| **enabled).count();

    info!(
        "Security controls check: {}/{} enabled",
        controls_enabled,
        details.len()
    );

    Ok(Finding::Controls {
        status: STATUS_COMPLETED.to_string(),
        controls_enabled,
        total_controls: details.len(),
        details,
    })
}

fn collect_rust_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_rust_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
    Ok(())
}
