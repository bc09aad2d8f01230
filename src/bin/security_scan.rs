use anyhow::Result;
use clap::Parser;
use guardrail_gateway::scan::{self, ScanOptions, Scanner, SystemRunner};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "security-scan")]
#[command(about = "Automated security checks for the guardrail gateway: static analysis, \
dependency audit, configuration and control review, summary report.")]
struct Cli {
    /// Project to scan
    #[arg(long, value_name = "DIR", default_value = ".")]
    project_root: PathBuf,

    /// Where reports are written (default: <project-root>/security-reports)
    #[arg(long, value_name = "DIR")]
    reports_dir: Option<PathBuf>,

    /// Service configuration to audit (default: <project-root>/config.yaml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Only generate reports from existing scan data
    #[arg(long)]
    export_only: bool,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    let mut options = ScanOptions::new(cli.project_root);
    if let Some(reports_dir) = cli.reports_dir {
        options.reports_dir = reports_dir;
    }
    if let Some(config) = cli.config {
        options.config_path = config;
    }

    println!("{}", "=".repeat(70));
    println!("SECURITY SCAN - {}", options.project_name);
    println!("{}", "=".repeat(70));

    let reports_dir = options.reports_dir.clone();
    let mut scanner = Scanner::new(Box::new(SystemRunner), options)?;

    let results = if cli.export_only {
        scanner.export_only()
    } else {
        scanner.run_all()
    };

    let Some(summary) = &results.summary else {
        anyhow::bail!("scan finished without a summary");
    };

    println!("{}", "=".repeat(70));
    println!("SCAN COMPLETE");
    println!("{}", "=".repeat(70));
    println!("Security Posture: {}", summary.security_posture.as_str());
    println!("Security Score: {}/100", summary.security_score);
    println!("High Severity Issues: {}", summary.high_severity_issues);
    println!("Medium Severity Issues: {}", summary.medium_severity_issues);
    println!();
    println!("Reports saved to: {}", reports_dir.display());
    println!("   - security_summary.md (human-readable)");
    println!("   - security_summary.json (machine-readable)");
    println!("{}", "=".repeat(70));

    Ok(scan::exit_code(summary, cli.export_only))
}
