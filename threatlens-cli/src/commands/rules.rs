//! `threatlens rules` command handler

use std::io::Write;

use serde::Serialize;

use threatlens_core::types::{Category, LogSource};
use threatlens_detection::rule::rules_for;
use threatlens_detection::{RULE_CATALOG, RuleDescriptor, TechniqueRegistry};

use crate::cli::{RulesAction, RulesArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `rules` command.
pub fn execute(args: RulesArgs, writer: &OutputWriter) -> Result<(), CliError> {
    match args.action {
        RulesAction::List { source } => {
            let report = list_rules(source.as_deref())?;
            writer.render(&report)
        }
        RulesAction::Techniques => writer.render(&list_techniques()),
    }
}

fn list_rules(source: Option<&str>) -> Result<RuleListReport, CliError> {
    let rules: Vec<&RuleDescriptor> = match source {
        Some(name) => {
            let source = LogSource::from_str_loose(name).ok_or_else(|| {
                CliError::Command(format!(
                    "unknown source: {name} (expected: host_auth, windows, cloud_audit)"
                ))
            })?;
            rules_for(source).collect()
        }
        None => RULE_CATALOG.iter().collect(),
    };

    let registry = TechniqueRegistry::builtin();
    Ok(RuleListReport {
        total: rules.len(),
        rules: rules
            .into_iter()
            .map(|r| RuleEntry {
                id: r.id,
                source: r.source.as_str(),
                title: r.title,
                category: r.category.to_string(),
                severity: r.severity,
                technique: registry.resolve(&r.category).id,
            })
            .collect(),
    })
}

fn list_techniques() -> TechniqueListReport {
    let registry = TechniqueRegistry::builtin();
    TechniqueListReport {
        techniques: registry
            .iter()
            .map(|(category, technique)| TechniqueEntry {
                category,
                id: technique.id,
                name: technique.name,
            })
            .collect(),
        fallback: registry.resolve(&Category::Other("Unmapped".to_owned())).id,
    }
}

#[derive(Serialize)]
pub struct RuleListReport {
    pub total: usize,
    pub rules: Vec<RuleEntry>,
}

#[derive(Serialize)]
pub struct RuleEntry {
    pub id: &'static str,
    pub source: &'static str,
    pub title: &'static str,
    pub category: String,
    pub severity: &'static str,
    pub technique: &'static str,
}

impl Render for RuleListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Detection Rules ({} total)",
            self.total.to_string().bold()
        )?;
        writeln!(w)?;
        writeln!(
            w,
            "{:<24} {:<12} {:<22} {:<14} {:<7} Title",
            "ID", "Source", "Category", "Severity", "MITRE"
        )?;
        writeln!(w, "{}", "-".repeat(110))?;

        for r in &self.rules {
            writeln!(
                w,
                "{:<24} {:<12} {:<22} {:<14} {:<7} {}",
                r.id, r.source, r.category, r.severity, r.technique, r.title
            )?;
        }

        Ok(())
    }
}

#[derive(Serialize)]
pub struct TechniqueListReport {
    pub techniques: Vec<TechniqueEntry>,
    /// Technique assigned to categories missing from the registry
    pub fallback: &'static str,
}

#[derive(Serialize)]
pub struct TechniqueEntry {
    pub category: &'static str,
    pub id: &'static str,
    pub name: &'static str,
}

impl Render for TechniqueListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "{}", "MITRE ATT&CK Mapping".bold())?;
        writeln!(w)?;
        writeln!(w, "{:<22} {:<7} Technique", "Category", "ID")?;
        writeln!(w, "{}", "-".repeat(70))?;
        for t in &self.techniques {
            writeln!(w, "{:<22} {:<7} {}", t.category, t.id, t.name)?;
        }
        writeln!(w)?;
        writeln!(w, "Unmapped categories: {}", self.fallback)?;
        Ok(())
    }
}
