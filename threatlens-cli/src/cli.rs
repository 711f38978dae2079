//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// threatlens -- security log threat classifier.
///
/// Use `threatlens <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "threatlens", version, about, long_about = None)]
pub struct Cli {
    /// Path to the threatlens.toml configuration file.
    #[arg(short, long, default_value = "threatlens.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize a log file, detect threats and map them to MITRE techniques.
    Analyze(AnalyzeArgs),

    /// Inspect the built-in detection rules.
    Rules(RulesArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- analyze ----

/// Input format selector for `analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Detect from the leading bytes of the file.
    Auto,
    /// Linux auth.log (syslog lines).
    Linux,
    /// Windows Security events as JSON lines.
    Windows,
    /// AWS CloudTrail document (`{"Records": [...]}`).
    Cloudtrail,
    /// Normalized records (JSON array or JSON lines).
    Records,
}

/// Analyze a single log file.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Log file to analyze.
    pub file: PathBuf,

    /// Input format.
    #[arg(long, default_value = "auto")]
    pub format: InputFormat,

    /// Minimum severity to report (info, low, medium, high).
    /// Defaults to `report.min_severity` from the configuration.
    #[arg(long)]
    pub min_severity: Option<String>,

    /// Order findings by timestamp instead of first occurrence.
    #[arg(long)]
    pub sort_by_time: bool,

    /// Attach mitigation advice to the report.
    #[arg(long)]
    pub advise: bool,
}

// ---- rules ----

/// Inspect detection rules and the technique registry.
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: RulesAction,
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List detection rules in evaluation order.
    List {
        /// Filter by log source (host_auth, windows, cloud_audit).
        #[arg(long)]
        source: Option<String>,
    },
    /// List the category to MITRE technique mapping.
    Techniques,
}

// ---- config ----

/// Manage threatlens configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, detection, report, advisory).
        #[arg(long)]
        section: Option<String>,
    },
}
