//! Core modules: reference data, the status store and its plumbing.
//!
//! Everything that touches the state file lives here; the user-facing
//! subsystems in [`crate::plugins`] only go through [`store::StatusStore`].

pub mod assets;
pub mod broker;
pub mod catalog;
pub mod config;
pub mod error;
pub mod output;
pub mod status;
pub mod store;
pub mod time;
