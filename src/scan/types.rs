use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STATUS_COMPLETED: &str = "COMPLETED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check")]
pub enum Finding {
    #[serde(rename = "Static Analysis")]
    StaticAnalysis {
        status: String,
        high_severity: usize,
        medium_severity: usize,
        low_severity: usize,
        total_issues: usize,
        report_path: String,
    },
    #[serde(rename = "Dependency Vulnerabilities")]
    DependencyAudit {
        status: String,
        vulnerabilities_found: usize,
        report_path: String,
    },
    #[serde(rename = "API Configuration")]
    Configuration {
        status: String,
        issues_found: usize,
        issues: Vec<String>,
    },
    #[serde(rename = "Security Controls")]
    Controls {
        status: String,
        controls_enabled: usize,
        total_controls: usize,
        details: BTreeMap<String, bool>,
    },
}

impl Finding {
    pub fn check_name(&self) -> &'static str {
        match self {
            Self::StaticAnalysis { .. } => "Static Analysis",
            Self::DependencyAudit { .. } => "Dependency Vulnerabilities",
            Self::Configuration { .. } => "API Configuration",
            Self::Controls { .. } => "Security Controls",
        }
    }

    pub fn status(&self) -> &str {
        match self {
            Self::StaticAnalysis { status, .. }
            | Self::DependencyAudit { status, .. }
            | Self::Configuration { status, .. }
            | Self::Controls { status, .. } => status,
        }
    }

    /// Short text for the "Issues Found" column of the markdown table.
    pub fn issues_label(&self) -> String {
        match self {
            Self::StaticAnalysis {
                high_severity,
                medium_severity,
                ..
            } => format!("{} High, {} Medium", high_severity, medium_severity),
            Self::DependencyAudit {
                vulnerabilities_found,
                ..
            } => format!("{} vulnerabilities", vulnerabilities_found),
            Self::Configuration { issues_found, .. } => format!("{} issues", issues_found),
            Self::Controls { .. } => "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Posture {
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "FAIR")]
    Fair,
    #[serde(rename = "NEEDS ATTENTION")]
    NeedsAttention,
}

impl Posture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::NeedsAttention => "NEEDS ATTENTION",
        }
    }

    pub fn score(&self) -> u8 {
        match self {
            Self::Good => 90,
            Self::Fair => 75,
            Self::NeedsAttention => 60,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Good => {
                "Security posture is acceptable. Continue monitoring and maintain current controls."
            }
            Self::Fair => {
                "Some security issues detected. Review and address medium severity findings before production."
            }
            Self::NeedsAttention => {
                "High severity issues detected. Address critical findings immediately before deployment."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub security_posture: Posture,
    pub security_score: u8,
    pub total_checks: usize,
    pub high_severity_issues: usize,
    pub medium_severity_issues: usize,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResults {
    pub scan_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub checks_performed: Vec<String>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub summary: Option<Summary>,
}

impl ScanResults {
    pub fn new() -> Self {
        Self {
            scan_timestamp: Utc::now(),
            checks_performed: Vec::new(),
            findings: Vec::new(),
            summary: None,
        }
    }

    pub fn record(&mut self, check: &str, finding: Finding) {
        self.checks_performed.push(check.to_string());
        self.findings.push(finding);
    }
}

impl Default for ScanResults {
    fn default() -> Self {
        Self::new()
    }
}
