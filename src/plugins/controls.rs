//! Control browsing and status tracking: the command surface used by the CLI.

use crate::core::catalog::{self, Catalog, Control};
use crate::core::error::TrackerError;
use crate::core::output;
use crate::core::status::ControlStatus;
use crate::core::store::{PersistedState, StatusStore};
use crate::plugins::report::{self, Report};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::warn;

/// One row of a listing.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ControlSummary {
    pub id: String,
    pub title: String,
    pub domain: String,
    pub status: ControlStatus,
    pub note: Option<String>,
}

/// Everything known about one control.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ControlDetails {
    pub control: Control,
    pub status: ControlStatus,
    pub note: Option<String>,
}

/// Facade over the catalog and the store.
pub struct Tracker {
    store: StatusStore,
}

impl Tracker {
    pub fn new(store: StatusStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        self.store.catalog()
    }

    pub fn initialize(&self) -> Result<bool, TrackerError> {
        self.store.initialize()
    }

    pub fn list_all(&self) -> Result<Vec<ControlSummary>, TrackerError> {
        let state = self.store.snapshot()?;
        Ok(self
            .catalog()
            .controls()
            .map(|c| summarize(c, &state))
            .collect())
    }

    /// Controls in `domain`, catalog order. An unknown domain yields nothing.
    pub fn list_by_domain(&self, domain: &str) -> Result<Vec<ControlSummary>, TrackerError> {
        let state = self.store.snapshot()?;
        let catalog = self.catalog();
        catalog
            .list_by_domain(domain)
            .into_iter()
            .map(|id| catalog.get_control(id).map(|c| summarize(c, &state)))
            .collect()
    }

    pub fn get_details(&self, id: &str) -> Result<ControlDetails, TrackerError> {
        let id = catalog::normalize_id(id);
        let control = self.catalog().get_control(&id)?.clone();
        let record = self.store.get_record(&id)?;
        Ok(ControlDetails {
            control,
            status: record.status,
            note: record.note,
        })
    }

    pub fn set_status(&self, id: &str, status: ControlStatus) -> Result<(), TrackerError> {
        self.store.set_status(&catalog::normalize_id(id), status)
    }

    pub fn set_note(&self, id: &str, note: &str) -> Result<(), TrackerError> {
        self.store.set_note(&catalog::normalize_id(id), note)
    }

    /// Read-only: a missing state file is reported as never updated.
    pub fn generate_report(&self) -> Result<Report, TrackerError> {
        Ok(report::generate_report(self.catalog(), &self.store.read_state()?))
    }

    pub fn close(self) -> Result<(), TrackerError> {
        self.store.close()
    }
}

fn summarize(control: &Control, state: &PersistedState) -> ControlSummary {
    ControlSummary {
        id: control.id.clone(),
        title: control.title.clone(),
        domain: control.domain.clone(),
        status: state.status_of(&control.id),
        note: state.control_notes.get(&control.id).cloned(),
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list controls in this domain (e.g. Organizational, People).
    #[clap(long)]
    pub domain: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Control id, e.g. A.5.1
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SetStatusArgs {
    /// Control id, e.g. A.5.1
    pub id: String,
    /// 1-4, or NOT_STARTED | IN_PROGRESS | IMPLEMENTED | NOT_APPLICABLE
    pub status: String,
    /// Also record a note.
    #[clap(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug)]
pub struct NoteArgs {
    /// Control id, e.g. A.5.1
    pub id: String,
    /// Note text; an empty string removes the note.
    pub text: String,
}

pub fn run_list(tracker: &Tracker, args: ListArgs) -> Result<(), TrackerError> {
    let rows = match &args.domain {
        Some(domain) => {
            let rows = tracker.list_by_domain(domain)?;
            if rows.is_empty() {
                warn!(domain = domain.as_str(), "no controls in domain");
                println!(
                    "No controls in domain '{}'. Known domains: {}",
                    domain,
                    tracker.catalog().domains().join(", ")
                );
                return Ok(());
            }
            println!("{}", format!("=== {} Controls ===", rows[0].domain).bold());
            rows
        }
        None => {
            println!("{}", format!("=== All Controls ({}) ===", tracker.catalog().len()).bold());
            tracker.list_all()?
        }
    };

    for row in rows {
        println!();
        println!("{}: {}", row.id.bold(), row.title);
        println!("Status: {}", row.status);
        if args.domain.is_none() {
            println!("Domain: {}", row.domain);
        }
        if let Some(note) = &row.note {
            println!("Note: {}", output::compact_line(note, 72));
        }
        println!("{}", output::rule(60));
    }
    Ok(())
}

pub fn run_domains(tracker: &Tracker) -> Result<(), TrackerError> {
    let catalog = tracker.catalog();
    for domain in catalog.domains() {
        println!("{} ({} controls)", domain, catalog.list_by_domain(domain).len());
    }
    Ok(())
}

pub fn run_show(tracker: &Tracker, args: ShowArgs) -> Result<(), TrackerError> {
    let details = tracker.get_details(&args.id)?;
    let c = &details.control;
    println!("{}", format!("=== {}: {} ===", c.id, c.title).bold());
    println!("\nStatus: {}", details.status);
    println!("Domain: {}", c.domain);
    println!("\nDescription: {}", c.description);
    println!("\nRecommendation: {}", c.recommendation);
    if !c.implementation.is_empty() {
        println!("\nImplementation Steps:");
        for (i, step) in c.implementation.iter().enumerate() {
            println!("{}. {}", i + 1, step);
        }
    }
    if !c.guidance.is_empty() {
        println!("\nGuidance:\n{}", c.guidance);
    }
    if let Some(note) = &details.note {
        println!("\nYour Notes: {}", note);
    }
    Ok(())
}

pub fn run_set_status(tracker: &Tracker, args: SetStatusArgs) -> Result<(), TrackerError> {
    // Validate both inputs before touching state.
    let id = catalog::normalize_id(&args.id);
    tracker.catalog().get_control(&id)?;
    let status = ControlStatus::from_selection(&args.status)?;

    tracker.set_status(&id, status)?;
    println!("Status for {} updated to: {}", id, status);
    if let Some(note) = args.note {
        tracker.set_note(&id, &note)?;
        println!("Note added successfully.");
    }
    Ok(())
}

pub fn run_note(tracker: &Tracker, args: NoteArgs) -> Result<(), TrackerError> {
    let id = catalog::normalize_id(&args.id);
    tracker.set_note(&id, &args.text)?;
    if args.text.trim().is_empty() {
        println!("Note for {} removed.", id);
    } else {
        println!("Note for {} saved.", id);
    }
    Ok(())
}
