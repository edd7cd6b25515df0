//! isotrack: track ISO/IEC 27001:2022 Annex A control implementation.
//!
//! **A local-first tracker: one user, one process, one JSON state file.**
//!
//! # Architecture
//!
//! - The **catalog** ([`core::catalog`](crate::core::catalog)) is immutable reference data: every
//!   control with its title, description, recommendation, domain and
//!   implementation guidance. The 93-control Annex A set is embedded; any
//!   JSON document of the same shape can replace it.
//! - The **status store** ([`core::store`](crate::core::store)) owns the state file. Each mutation
//!   is a read-modify-write cycle serialized by the [`core::broker`](crate::core::broker) (mutex
//!   plus lock file) and finished with an atomic rename, so a crash leaves the
//!   previous document intact.
//! - The **report** ([`plugins::report`](crate::plugins::report)) is a pure function of catalog and
//!   state.
//!
//! # Examples
//!
//! ```bash
//! isotrack init
//! isotrack list --domain People
//! isotrack set-status A.6.3 in-progress --note "Awareness training scheduled"
//! isotrack report
//! ```

pub mod core;
pub mod plugins;

use crate::core::{
    broker,
    catalog::CatalogSource,
    config::{self, ConfigOverrides, TrackerConfig},
    error::TrackerError,
    store::StatusStore,
};
use crate::plugins::{controls, report, roadmap};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser, Debug)]
#[clap(
    name = "isotrack",
    version = env!("CARGO_PKG_VERSION"),
    about = "ISO/IEC 27001:2022 implementation tracker"
)]
struct Cli {
    /// State file (overrides isotrack.toml and ISOTRACK_DATA_FILE).
    #[clap(long, global = true)]
    data_file: Option<PathBuf>,
    /// Control catalog JSON to use instead of the embedded Annex A set.
    #[clap(long, global = true)]
    catalog: Option<PathBuf>,
    /// Configuration file (default: ./isotrack.toml if present).
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the state file if it does not exist
    #[clap(name = "init")]
    Init,

    /// List controls with their status
    #[clap(name = "list", visible_alias = "ls")]
    List(controls::ListArgs),

    /// List control domains
    #[clap(name = "domains")]
    Domains,

    /// Show full details of one control
    #[clap(name = "show")]
    Show(controls::ShowArgs),

    /// Record the implementation status of a control
    #[clap(name = "set-status", visible_alias = "set")]
    SetStatus(controls::SetStatusArgs),

    /// Attach a note to a control
    #[clap(name = "note")]
    Note(controls::NoteArgs),

    /// Generate the compliance progress report
    #[clap(name = "report")]
    Report(report::ReportCli),

    /// Show the phased implementation roadmap
    #[clap(name = "roadmap")]
    Roadmap(roadmap::RoadmapArgs),

    /// Show the mutation audit log
    #[clap(name = "audit")]
    Audit,
}

pub fn run() -> Result<(), TrackerError> {
    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        config: cli.config,
        data_file: cli.data_file,
        catalog: cli.catalog,
    };

    match cli.command {
        // Static reference output needs neither catalog nor state.
        Command::Roadmap(args) => roadmap::run_roadmap(args),
        Command::Init => with_tracker(&overrides, |tracker, cfg| {
            if tracker.initialize()? {
                println!("{} {}", "●".bright_green(), cfg.data_file.display());
            } else {
                println!(
                    "{} {} {}",
                    "✓".bright_green(),
                    cfg.data_file.display(),
                    "(preserved - existing data kept)".bright_black()
                );
            }
            Ok(())
        }),
        Command::List(args) => with_tracker(&overrides, |t, _| controls::run_list(t, args)),
        Command::Domains => with_tracker(&overrides, |t, _| controls::run_domains(t)),
        Command::Show(args) => with_tracker(&overrides, |t, _| controls::run_show(t, args)),
        Command::SetStatus(args) => {
            with_tracker(&overrides, |t, _| controls::run_set_status(t, args))
        }
        Command::Note(args) => with_tracker(&overrides, |t, _| controls::run_note(t, args)),
        Command::Report(args) => {
            with_tracker(&overrides, |t, _| report::run_report_cli(t.store(), args))
        }
        Command::Audit => with_tracker(&overrides, |tracker, _| {
            match tracker.store().audit_log_path() {
                Some(path) => {
                    for ev in broker::read_events(path)? {
                        println!(
                            "{} {} {} {} {}",
                            ev.ts,
                            ev.event_id,
                            ev.op,
                            ev.control_id.as_deref().unwrap_or("-"),
                            ev.status
                        );
                    }
                }
                None => println!("Audit log disabled (audit_log = false)."),
            }
            Ok(())
        }),
    }
}

/// Resolve configuration, load the catalog and run `f` against an open tracker.
fn with_tracker<F>(overrides: &ConfigOverrides, f: F) -> Result<(), TrackerError>
where
    F: FnOnce(&controls::Tracker, &TrackerConfig) -> Result<(), TrackerError>,
{
    let current_dir = std::env::current_dir()?;
    let cfg = config::resolve(
        &current_dir,
        std::env::var(config::DATA_FILE_ENV).ok(),
        overrides,
    )?;
    debug!(data_file = %cfg.data_file.display(), catalog = ?cfg.catalog, "configuration resolved");

    let catalog = Arc::new(cfg.catalog.load()?);
    if let CatalogSource::File(path) = &cfg.catalog {
        debug!(path = %path.display(), controls = catalog.len(), "external catalog loaded");
    }
    let store = StatusStore::open(&cfg.data_file, catalog, cfg.store_options());
    let tracker = controls::Tracker::new(store);
    f(&tracker, &cfg)?;
    tracker.close()
}
