//! Control catalog: the immutable reference set of controls.
//!
//! The catalog is supplied once at startup by a [`CatalogSource`] and is never
//! mutated afterwards. Iteration order is the order of the source document and
//! is observable in listings and reports.

use crate::core::assets;
use crate::core::error::TrackerError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Control {
    pub id: String,
    pub title: String,
    pub domain: String,
    pub description: String,
    pub recommendation: String,
    /// Ordered implementation steps.
    #[serde(default)]
    pub implementation: Vec<String>,
    /// Supplementary guidance text (ISO 27002 for the default catalog).
    #[serde(default)]
    pub guidance: String,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    standard: String,
    controls: Vec<Control>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    standard: String,
    controls: Vec<Control>,
    index: HashMap<String, usize>,
}

/// Where the catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogSource {
    /// The ISO/IEC 27001:2022 Annex A set compiled into the binary.
    #[default]
    Embedded,
    /// A JSON document on disk with the same shape as the embedded one.
    File(PathBuf),
}

impl CatalogSource {
    pub fn load(&self) -> Result<Catalog, TrackerError> {
        match self {
            CatalogSource::Embedded => {
                let raw = assets::get_asset(assets::CATALOG_ASSET).ok_or_else(|| {
                    TrackerError::ValidationError("embedded catalog missing".to_string())
                })?;
                Catalog::from_json_str(&raw)
            }
            CatalogSource::File(path) => Catalog::load(path),
        }
    }
}

/// Normalize user-entered control ids (`a.5.1 ` -> `A.5.1`).
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

impl Catalog {
    /// Build a catalog from controls in iteration order.
    pub fn new(standard: &str, controls: Vec<Control>) -> Result<Self, TrackerError> {
        if controls.is_empty() {
            return Err(TrackerError::ValidationError(
                "catalog contains no controls".to_string(),
            ));
        }
        let id_re = Regex::new(r"^[A-Z]+(\.[0-9]+)+$")
            .map_err(|e| TrackerError::ValidationError(e.to_string()))?;

        let mut index = HashMap::with_capacity(controls.len());
        for (pos, control) in controls.iter().enumerate() {
            if !id_re.is_match(&control.id) {
                return Err(TrackerError::ValidationError(format!(
                    "malformed control id '{}'",
                    control.id
                )));
            }
            if control.title.trim().is_empty() || control.domain.trim().is_empty() {
                return Err(TrackerError::ValidationError(format!(
                    "control {} has an empty title or domain",
                    control.id
                )));
            }
            if index.insert(control.id.clone(), pos).is_some() {
                return Err(TrackerError::ValidationError(format!(
                    "duplicate control id '{}'",
                    control.id
                )));
            }
        }

        Ok(Self {
            standard: standard.to_string(),
            controls,
            index,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TrackerError> {
        let doc: CatalogDocument = serde_json::from_str(raw)
            .map_err(|e| TrackerError::ValidationError(format!("catalog: {}", e)))?;
        Self::new(&doc.standard, doc.controls)
    }

    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn standard(&self) -> &str {
        &self.standard
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get_control(&self, id: &str) -> Result<&Control, TrackerError> {
        self.index
            .get(id)
            .map(|&pos| &self.controls[pos])
            .ok_or_else(|| TrackerError::UnknownControl(id.to_string()))
    }

    /// All controls in catalog order.
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter()
    }

    /// Ids of the controls in `domain`, in catalog order.
    pub fn list_by_domain(&self, domain: &str) -> Vec<&str> {
        let wanted = domain.trim();
        self.controls
            .iter()
            .filter(|c| c.domain.eq_ignore_ascii_case(wanted))
            .map(|c| c.id.as_str())
            .collect()
    }

    /// Distinct domains in order of first appearance.
    pub fn domains(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for control in &self.controls {
            if !seen.contains(&control.domain.as_str()) {
                seen.push(control.domain.as_str());
            }
        }
        seen
    }
}
