//! Implementation status of a single control.

use crate::core::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recorded implementation state. Persisted under its `SCREAMING_SNAKE_CASE` name.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlStatus {
    #[default]
    NotStarted,
    InProgress,
    Implemented,
    NotApplicable,
}

impl ControlStatus {
    /// Every status, in menu and report order.
    pub const ALL: [ControlStatus; 4] = [
        ControlStatus::NotStarted,
        ControlStatus::InProgress,
        ControlStatus::Implemented,
        ControlStatus::NotApplicable,
    ];

    /// Persisted enum name.
    pub fn name(&self) -> &'static str {
        match self {
            ControlStatus::NotStarted => "NOT_STARTED",
            ControlStatus::InProgress => "IN_PROGRESS",
            ControlStatus::Implemented => "IMPLEMENTED",
            ControlStatus::NotApplicable => "NOT_APPLICABLE",
        }
    }

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            ControlStatus::NotStarted => "Not Started",
            ControlStatus::InProgress => "In Progress",
            ControlStatus::Implemented => "Implemented",
            ControlStatus::NotApplicable => "Not Applicable",
        }
    }

    /// Controls in this state still need work.
    pub fn needs_attention(&self) -> bool {
        matches!(self, ControlStatus::NotStarted | ControlStatus::InProgress)
    }

    /// Parse a user selection: the 1-based menu number, the persisted name,
    /// or the label. Case, hyphens and spaces are not significant.
    pub fn from_selection(input: &str) -> Result<Self, TrackerError> {
        let trimmed = input.trim();
        if let Ok(n) = trimmed.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| Self::ALL.get(i).copied())
                .ok_or_else(|| TrackerError::InvalidStatusSelection(input.to_string()));
        }

        let key: String = trimmed
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        Self::ALL
            .into_iter()
            .find(|s| s.name() == key)
            .ok_or_else(|| TrackerError::InvalidStatusSelection(input.to_string()))
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
