//! User-facing subsystems built on the core store.
//!
//! - `controls`: browsing the catalog and recording status and notes
//! - `report`: aggregate progress report
//! - `roadmap`: phased implementation plan

pub mod controls;
pub mod report;
pub mod roadmap;
