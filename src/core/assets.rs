//! Embedded reference data.
//!
//! The default control catalog and the implementation roadmap are baked into
//! the binary so the tool works with no files besides its own state.

use rust_embed::RustEmbed;

pub const CATALOG_ASSET: &str = "catalog.json";
pub const ROADMAP_ASSET: &str = "roadmap.json";

#[derive(RustEmbed)]
#[folder = "data/"]
#[include = "*.json"]
struct DataAssets;

/// Return an embedded data file as text.
pub fn get_asset(name: &str) -> Option<String> {
    DataAssets::get(name).map(|f| String::from_utf8_lossy(&f.data).into_owned())
}

pub fn list_assets() -> Vec<String> {
    DataAssets::iter().map(|p| p.into_owned()).collect()
}
