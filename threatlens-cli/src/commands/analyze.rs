//! `threatlens analyze` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use threatlens_core::config::ThreatlensConfig;
use threatlens_core::error::{ParseError, ThreatlensError};
use threatlens_core::types::{Advice, AnnotatedFinding, IncidentSummary, Severity};
use threatlens_detection::engine::analyze_batch_with;
use threatlens_detection::parser::LogFormat;
use threatlens_detection::report::{retain_min_severity, sort_by_time};
use threatlens_detection::{
    AdvisoryService, FindingStats, NormalizerRouter, TechniqueMapper, summarize,
};

use crate::cli::{AnalyzeArgs, InputFormat};
use crate::error::CliError;
use crate::output::{OutputWriter, Render, severity_label};

/// Execute the `analyze` command.
pub async fn execute(
    args: AnalyzeArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = ThreatlensConfig::load_or_default(config_path).await?;
    let min_severity = resolve_min_severity(args.min_severity.as_deref(), &config)?;

    // Reject oversized files before reading them into memory.
    let size = usize::try_from(tokio::fs::metadata(&args.file).await?.len()).unwrap_or(usize::MAX);
    let max = config.detection.max_input_size;
    if size > max {
        return Err(ThreatlensError::from(ParseError::TooLarge { size, max }).into());
    }

    let raw = tokio::fs::read(&args.file).await?;
    let format = resolve_format(args.format, &raw);
    info!(file = %args.file.display(), format = %format, bytes = raw.len(), "analyzing log file");

    let mut report =
        analyze_bytes(&raw, format, min_severity, args.sort_by_time, args.advise, &config)?;
    report.source = args.file.display().to_string();

    writer.render(&report)?;
    Ok(())
}

/// Run normalization, detection and reporting over an in-memory buffer.
pub fn analyze_bytes(
    raw: &[u8],
    format: LogFormat,
    min_severity: Severity,
    by_time: bool,
    advise: bool,
    config: &ThreatlensConfig,
) -> Result<AnalysisReport, CliError> {
    let router = NormalizerRouter::with_max_input_size(config.detection.max_input_size);
    let entries = router.normalize_with(format.as_str(), raw)?;

    let mut findings = analyze_batch_with(&entries, &TechniqueMapper::new(), &config.detection);
    retain_min_severity(&mut findings, min_severity);
    if by_time {
        sort_by_time(&mut findings);
    }
    debug!(entries = entries.len(), findings = findings.len(), "analysis finished");

    let stats = FindingStats::compute(&findings, config.report.top_ips);
    let summary = summarize(&findings);
    let advice = (advise || config.advisory.enabled)
        .then(|| AdvisoryService::default().recommend_for(&summary));

    Ok(AnalysisReport {
        source: String::new(),
        format: format.as_str(),
        entries: entries.len(),
        min_severity,
        findings,
        stats,
        summary,
        advice,
    })
}

fn resolve_format(selected: InputFormat, raw: &[u8]) -> LogFormat {
    match selected {
        InputFormat::Auto => NormalizerRouter::detect_format(raw),
        InputFormat::Linux => LogFormat::Linux,
        InputFormat::Windows => LogFormat::Windows,
        InputFormat::Cloudtrail => LogFormat::CloudTrail,
        InputFormat::Records => LogFormat::Records,
    }
}

fn resolve_min_severity(
    flag: Option<&str>,
    config: &ThreatlensConfig,
) -> Result<Severity, CliError> {
    let value = flag.unwrap_or(&config.report.min_severity);
    Severity::from_str_loose(value).ok_or_else(|| {
        CliError::Command(format!(
            "invalid severity: {value} (expected: info, low, medium, high)"
        ))
    })
}

/// Result of analyzing one log file.
#[derive(Serialize)]
pub struct AnalysisReport {
    pub source: String,
    pub format: &'static str,
    /// Number of normalized log entries
    pub entries: usize,
    pub min_severity: Severity,
    pub findings: Vec<AnnotatedFinding>,
    pub stats: FindingStats,
    pub summary: IncidentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<Advice>,
}

impl Render for AnalysisReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Analysis: {} (format: {}, {} entries)",
            self.source.bold(),
            self.format,
            self.entries
        )?;
        writeln!(w)?;

        if self.findings.is_empty() {
            writeln!(w, "  {}", "No findings.".green())?;
            return Ok(());
        }

        writeln!(
            w,
            "Findings ({} total, min severity {})",
            self.findings.len().to_string().bold(),
            self.min_severity
        )?;
        writeln!(
            w,
            "{:<8} {:<22} {:<7} {:<16} {:<16} Description",
            "Severity", "Category", "MITRE", "User", "IP"
        )?;
        writeln!(w, "{}", "-".repeat(100))?;
        for annotated in &self.findings {
            let f = &annotated.finding;
            writeln!(
                w,
                "{:<8} {:<22} {:<7} {:<16} {:<16} {}",
                severity_label(f.severity),
                f.category.as_str(),
                annotated.mitre_id,
                f.user.as_deref().unwrap_or("-"),
                f.ip.as_deref().unwrap_or("-"),
                f.description
            )?;
        }

        writeln!(w)?;
        writeln!(
            w,
            "Severity: high {}, medium {}, low {}, info {}",
            self.stats.severity_count(Severity::High),
            self.stats.severity_count(Severity::Medium),
            self.stats.severity_count(Severity::Low),
            self.stats.severity_count(Severity::Info)
        )?;
        writeln!(
            w,
            "Unique IPs: {}, unique users: {}",
            self.stats.unique_ips, self.stats.unique_users
        )?;

        if !self.stats.top_ips.is_empty() {
            writeln!(w)?;
            writeln!(w, "Top source IPs")?;
            for ip in &self.stats.top_ips {
                writeln!(
                    w,
                    "  {:<16} {:>5}  {:<22} {}",
                    ip.ip,
                    ip.count,
                    ip.top_category,
                    severity_label(ip.max_severity)
                )?;
            }
        }

        if let Some(advice) = &self.advice {
            writeln!(w)?;
            writeln!(w, "Advice (priority: {})", advice.priority.bold())?;
            writeln!(w, "  {}", advice.risk_summary)?;
            writeln!(w, "  Immediate actions:")?;
            for action in &advice.immediate_actions {
                writeln!(w, "    - {action}")?;
            }
            writeln!(w, "  Preventive controls:")?;
            for control in &advice.preventive_controls {
                writeln!(w, "    - {control}")?;
            }
        }

        Ok(())
    }
}
