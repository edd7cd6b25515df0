use crate::core::assets;
use crate::core::error::TrackerError;
use clap::Args;
use colored::Colorize;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct RoadmapArgs {
    /// Include the implementation guidance for each phase.
    #[clap(long)]
    pub guidance: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Phase {
    pub phase: u32,
    pub name: String,
    pub tasks: Vec<String>,
    #[serde(default)]
    pub guidance: String,
}

#[derive(Debug, Deserialize)]
struct RoadmapDocument {
    phases: Vec<Phase>,
}

/// The embedded implementation roadmap, phases in ascending order.
pub fn load_roadmap() -> Result<Vec<Phase>, TrackerError> {
    let raw = assets::get_asset(assets::ROADMAP_ASSET)
        .ok_or_else(|| TrackerError::ValidationError("embedded roadmap missing".to_string()))?;
    parse_roadmap(&raw)
}

pub fn parse_roadmap(raw: &str) -> Result<Vec<Phase>, TrackerError> {
    let doc: RoadmapDocument = serde_json::from_str(raw)
        .map_err(|e| TrackerError::ValidationError(format!("roadmap: {}", e)))?;
    let mut phases = doc.phases;
    phases.sort_by_key(|p| p.phase);
    Ok(phases)
}

pub fn render_roadmap(phases: &[Phase], with_guidance: bool) -> String {
    let mut out = format!("{}\n", "=== Implementation Roadmap ===".bold());
    for phase in phases {
        out.push_str(&format!("\nPhase {}: {}\n", phase.phase, phase.name.bold()));
        out.push_str("Tasks:\n");
        for task in &phase.tasks {
            out.push_str(&format!(" - {}\n", task));
        }
        if with_guidance && !phase.guidance.is_empty() {
            out.push('\n');
            for line in phase.guidance.lines() {
                out.push_str(&format!("   {}\n", line));
            }
        }
    }
    out
}

pub fn run_roadmap(args: RoadmapArgs) -> Result<(), TrackerError> {
    let phases = load_roadmap()?;
    print!("{}", render_roadmap(&phases, args.guidance));
    Ok(())
}
