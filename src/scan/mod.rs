//! Batch security scan: runs the external scanners over a project tree and
//! writes a scored summary report.

pub mod checks;
pub mod report;
pub mod runner;
pub mod types;

pub use runner::{SystemRunner, ToolOutput, ToolRunner};
pub use types::{Finding, Posture, ScanResults, Summary};

use crate::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    StaticAnalysis,
    DependencyAudit,
    ConfigurationAudit,
    ControlAudit,
    Summary,
    Done,
}

impl ScanStage {
    pub fn next(self) -> Self {
        match self {
            Self::StaticAnalysis => Self::DependencyAudit,
            Self::DependencyAudit => Self::ConfigurationAudit,
            Self::ConfigurationAudit => Self::ControlAudit,
            Self::ControlAudit => Self::Summary,
            Self::Summary | Self::Done => Self::Done,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }

    /// Name recorded in `checks_performed` when the stage completes.
    pub fn check_label(self) -> &'static str {
        match self {
            Self::StaticAnalysis => "Static Analysis Scan",
            Self::DependencyAudit => "Dependency Vulnerability Check",
            Self::ConfigurationAudit => "API Configuration Validation",
            Self::ControlAudit => "Security Controls Verification",
            Self::Summary => "Summary Report",
            Self::Done => "Done",
        }
    }
}

/// Process exit code for a finished scan: 1 when a full scan found
/// high-severity issues, 0 otherwise. Re-exported summaries never fail.
pub fn exit_code(summary: &Summary, export_only: bool) -> i32 {
    if !export_only && summary.high_severity_issues > 0 { 1 } else { 0 }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub project_root: PathBuf,
    pub reports_dir: PathBuf,
    pub config_path: PathBuf,
    pub project_name: String,
}

impl ScanOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            reports_dir: project_root.join("security-reports"),
            config_path: project_root.join("config.yaml"),
            project_name: "LLM Guardrails Demo API".to_string(),
            project_root,
        }
    }
}

pub struct Scanner {
    runner: Box<dyn ToolRunner>,
    options: ScanOptions,
    stage: ScanStage,
    results: ScanResults,
}

impl Scanner {
    pub fn new(runner: Box<dyn ToolRunner>, options: ScanOptions) -> Result<Self> {
        std::fs::create_dir_all(&options.reports_dir)?;
        Ok(Self {
            runner,
            options,
            stage: ScanStage::StaticAnalysis,
            results: ScanResults::new(),
        })
    }

    pub fn results(&self) -> &ScanResults {
        &self.results
    }

    /// Runs every stage in order. A failing stage is logged and skipped.
    pub fn run_all(&mut self) -> &ScanResults {
        while !self.stage.is_terminal() {
            self.step();
        }
        &self.results
    }

    /// Re-synthesizes the summary from a previous run's results, if any.
    pub fn export_only(&mut self) -> &ScanResults {
        match report::load_results(&self.options.reports_dir) {
            Ok(Some(previous)) => {
                info!(
                    "Loaded {} findings from previous scan",
                    previous.findings.len()
                );
                self.results = previous;
            }
            Ok(None) => info!("No previous scan results, exporting empty summary"),
            Err(e) => warn!("Ignoring unreadable previous scan results: {}", e),
        }
        self.stage = ScanStage::Summary;
        self.run_all()
    }

    pub fn step(&mut self) -> ScanStage {
        let stage = self.stage;
        debug!("Scan stage {:?}", stage);

        if let Err(e) = self.run_stage(stage) {
            warn!("{} failed: {}", stage.check_label(), e);
        }

        self.stage = stage.next();
        if self.stage != stage {
            debug!("Scan stage transition: {:?} -> {:?}", stage, self.stage);
        }
        self.stage
    }

    fn run_stage(&mut self, stage: ScanStage) -> Result<()> {
        let opts = &self.options;
        let finding = match stage {
            ScanStage::StaticAnalysis => {
                checks::static_analysis(self.runner.as_ref(), &opts.project_root, &opts.reports_dir)?
            }
            ScanStage::DependencyAudit => {
                checks::dependency_audit(self.runner.as_ref(), &opts.project_root, &opts.reports_dir)?
            }
            ScanStage::ConfigurationAudit => {
                checks::configuration_audit(&opts.project_root, &opts.config_path)?
            }
            ScanStage::ControlAudit => checks::control_audit(&opts.project_root)?,
            ScanStage::Summary => {
                self.results.summary = Some(report::synthesize_summary(&self.results));
                let (json_path, md_path) = report::write_reports(
                    &self.results,
                    &self.options.project_name,
                    &self.options.reports_dir,
                )?;
                info!(
                    "Security summary saved to {} and {}",
                    json_path.display(),
                    md_path.display()
                );
                return Ok(());
            }
            ScanStage::Done => return Err(Error::scan("scan already finished")),
        };

        self.results.record(stage.check_label(), finding);
        Ok(())
    }
}
