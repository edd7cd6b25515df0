use crate::core::catalog::Catalog;
use crate::core::error::TrackerError;
use crate::core::output;
use crate::core::status::ControlStatus;
use crate::core::store::{PersistedState, StatusStore};
use crate::core::time;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use serde::Serialize;

pub const NEVER_UPDATED: &str = "Never";

#[derive(Parser, Debug)]
#[clap(name = "report", about = "Generate the compliance progress report")]
pub struct ReportCli {
    /// Output format.
    #[clap(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatusTally {
    pub status: ControlStatus,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AttentionItem {
    pub id: String,
    pub title: String,
    pub status: ControlStatus,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DomainProgress {
    pub domain: String,
    pub total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub implemented: usize,
    pub not_applicable: usize,
}

impl DomainProgress {
    fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            total: 0,
            not_started: 0,
            in_progress: 0,
            implemented: 0,
            not_applicable: 0,
        }
    }

    fn add(&mut self, status: ControlStatus) {
        self.total += 1;
        match status {
            ControlStatus::NotStarted => self.not_started += 1,
            ControlStatus::InProgress => self.in_progress += 1,
            ControlStatus::Implemented => self.implemented += 1,
            ControlStatus::NotApplicable => self.not_applicable += 1,
        }
    }
}

/// Immutable summary of progress at one point in time.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Report {
    pub standard: String,
    pub total_controls: usize,
    /// One entry per status, in [`ControlStatus::ALL`] order.
    pub tallies: Vec<StatusTally>,
    /// Controls still needing work, in catalog order.
    pub attention: Vec<AttentionItem>,
    pub domains: Vec<DomainProgress>,
    pub last_updated: String,
}

impl Report {
    pub fn count(&self, status: ControlStatus) -> usize {
        self.tallies
            .iter()
            .find(|t| t.status == status)
            .map(|t| t.count)
            .unwrap_or(0)
    }

    pub fn percentage(&self, status: ControlStatus) -> f64 {
        self.tallies
            .iter()
            .find(|t| t.status == status)
            .map(|t| t.percentage)
            .unwrap_or(0.0)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", "=== Compliance Report ===".bold()));
        if !self.standard.is_empty() {
            out.push_str(&format!("{}\n", self.standard));
        }
        out.push_str(&format!("\nTotal Controls: {}\n", self.total_controls));
        for tally in &self.tallies {
            let line = format!(
                "{}: {} ({:.1}%)",
                tally.status.label(),
                tally.count,
                tally.percentage
            );
            out.push_str(&format!(
                "{} {}\n",
                output::progress_bar(tally.percentage, 20),
                paint(tally.status, &line)
            ));
        }

        out.push_str("\nBy Domain:\n");
        for d in &self.domains {
            out.push_str(&format!(
                " - {}: {}/{} implemented, {} in progress, {} not started, {} not applicable\n",
                d.domain, d.implemented, d.total, d.in_progress, d.not_started, d.not_applicable
            ));
        }

        out.push_str("\nControls Needing Attention:\n");
        if self.attention.is_empty() {
            out.push_str(" (none)\n");
        }
        for item in &self.attention {
            out.push_str(&format!(
                " - {}: {} ({})\n",
                item.id,
                item.title,
                paint(item.status, item.status.name())
            ));
        }

        out.push_str(&format!("\nLast Updated: {}\n", self.last_updated));
        out
    }
}

fn paint(status: ControlStatus, text: &str) -> String {
    match status {
        ControlStatus::NotStarted => text.red().to_string(),
        ControlStatus::InProgress => text.yellow().to_string(),
        ControlStatus::Implemented => text.green().to_string(),
        ControlStatus::NotApplicable => text.bright_black().to_string(),
    }
}

/// Pure aggregation over the catalog and one state snapshot.
///
/// Only catalog controls are counted, so the tallies always sum to
/// `total_controls`; state entries for ids outside the catalog are ignored.
/// Percentages are not rounded and need not sum to exactly 100.
pub fn generate_report(catalog: &Catalog, state: &PersistedState) -> Report {
    let total = catalog.len();
    let mut counts = [0usize; ControlStatus::ALL.len()];
    let mut attention = Vec::new();
    let mut domains: Vec<DomainProgress> = Vec::new();

    for control in catalog.controls() {
        let status = state.status_of(&control.id);
        if let Some(slot) = ControlStatus::ALL.iter().position(|s| *s == status) {
            counts[slot] += 1;
        }
        if status.needs_attention() {
            attention.push(AttentionItem {
                id: control.id.clone(),
                title: control.title.clone(),
                status,
            });
        }
        match domains.iter_mut().find(|d| d.domain == control.domain) {
            Some(d) => d.add(status),
            None => {
                let mut d = DomainProgress::new(&control.domain);
                d.add(status);
                domains.push(d);
            }
        }
    }

    let tallies = ControlStatus::ALL
        .iter()
        .zip(counts)
        .map(|(status, count)| StatusTally {
            status: *status,
            count,
            percentage: if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            },
        })
        .collect();

    Report {
        standard: catalog.standard().to_string(),
        total_controls: total,
        tallies,
        attention,
        domains,
        last_updated: state
            .last_updated
            .clone()
            .unwrap_or_else(|| NEVER_UPDATED.to_string()),
    }
}

pub fn run_report_cli(store: &StatusStore, cli: ReportCli) -> Result<(), TrackerError> {
    let report = generate_report(store.catalog(), &store.read_state()?);
    match cli.format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => {
            let envelope = time::command_envelope(
                "report",
                "ok",
                serde_json::json!({ "report": report }),
            );
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
    }
    Ok(())
}
