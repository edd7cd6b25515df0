//! Status store: durable per-control status and notes.
//!
//! The whole [`PersistedState`] lives in one JSON document. Reads parse the
//! document afresh; every mutation is a read-modify-write cycle run under the
//! [`StateBroker`] lock and finished with an atomic replace, so each call is
//! durable on return and concurrent writers cannot lose each other's updates.

use crate::core::broker::{self, StateBroker};
use crate::core::catalog::Catalog;
use crate::core::error::TrackerError;
use crate::core::status::ControlStatus;
use crate::core::time;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// The durable aggregate, field for field as it appears on disk.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PersistedState {
    /// Legacy free-form section; carried through rewrites untouched.
    #[serde(default)]
    pub progress: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub controls_status: BTreeMap<String, ControlStatus>,
    #[serde(default)]
    pub control_notes: BTreeMap<String, String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl PersistedState {
    pub fn fresh() -> Self {
        Self {
            last_updated: Some(time::now_epoch_z()),
            ..Self::default()
        }
    }

    pub fn status_of(&self, id: &str) -> ControlStatus {
        self.controls_status.get(id).copied().unwrap_or_default()
    }

    pub fn note_of(&self, id: &str) -> &str {
        self.control_notes.get(id).map(String::as_str).unwrap_or("")
    }

    fn touch(&mut self) {
        self.last_updated = Some(time::next_timestamp(self.last_updated.as_deref()));
    }
}

/// Status and note of one control.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub status: ControlStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub audit_log: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { audit_log: true }
    }
}

pub struct StatusStore {
    path: PathBuf,
    catalog: Arc<Catalog>,
    broker: StateBroker,
}

impl StatusStore {
    /// Bind a store to `path`. Nothing is touched on disk until
    /// [`StatusStore::initialize`] or the first read or write.
    pub fn open(path: &Path, catalog: Arc<Catalog>, options: StoreOptions) -> Self {
        Self {
            path: path.to_path_buf(),
            broker: StateBroker::new(path, options.audit_log),
            catalog,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn audit_log_path(&self) -> Option<&Path> {
        self.broker.audit_log_path()
    }

    /// Create the backing file with empty mappings if it does not exist.
    /// An existing file is never rewritten; it is parsed so corruption is
    /// reported up front. Returns whether a file was created.
    pub fn initialize(&self) -> Result<bool, TrackerError> {
        if self.path.exists() {
            self.read_existing()?;
            debug!(path = %self.path.display(), "state file present");
            return Ok(false);
        }
        self.ensure_parent()?;
        self.broker.with_lock("store.init", None, |commit| {
            // Re-check under the lock; another writer may have won the race.
            if self.path.exists() {
                return Ok(false);
            }
            let bytes = encode(&PersistedState::fresh())?;
            broker::replace_atomically(&self.path, &bytes)?;
            commit.record(&bytes);
            info!(path = %self.path.display(), "state file created");
            Ok(true)
        })
    }

    /// Current durable state. A missing file is recreated with defaults.
    pub fn snapshot(&self) -> Result<PersistedState, TrackerError> {
        match self.read_existing() {
            Ok(state) => Ok(state),
            Err(TrackerError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                self.initialize()?;
                self.read_existing()
            }
            Err(e) => Err(e),
        }
    }

    /// Current durable state without touching disk. A missing file reads as
    /// [`PersistedState::default`], which has no `last_updated`.
    pub fn read_state(&self) -> Result<PersistedState, TrackerError> {
        match self.read_existing() {
            Err(TrackerError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                Ok(PersistedState::default())
            }
            other => other,
        }
    }

    pub fn get_status(&self, id: &str) -> Result<ControlStatus, TrackerError> {
        self.check_known(id)?;
        Ok(self.snapshot()?.status_of(id))
    }

    /// Recorded note, or an empty string.
    pub fn get_note(&self, id: &str) -> Result<String, TrackerError> {
        self.check_known(id)?;
        Ok(self.snapshot()?.note_of(id).to_string())
    }

    pub fn get_record(&self, id: &str) -> Result<StatusRecord, TrackerError> {
        self.check_known(id)?;
        let state = self.snapshot()?;
        Ok(StatusRecord {
            status: state.status_of(id),
            note: state.control_notes.get(id).cloned(),
        })
    }

    pub fn set_status(&self, id: &str, status: ControlStatus) -> Result<(), TrackerError> {
        self.check_known(id)?;
        self.transact("status.set", id, |state| {
            state.controls_status.insert(id.to_string(), status);
        })?;
        info!(control_id = id, status = status.name(), "status updated");
        Ok(())
    }

    /// Record a note. A blank note removes the entry.
    pub fn set_note(&self, id: &str, note: &str) -> Result<(), TrackerError> {
        self.check_known(id)?;
        self.transact("note.set", id, |state| {
            if note.trim().is_empty() {
                state.control_notes.remove(id);
            } else {
                state.control_notes.insert(id.to_string(), note.to_string());
            }
        })?;
        info!(control_id = id, "note updated");
        Ok(())
    }

    /// End the store's lifecycle. All writes are already durable.
    pub fn close(self) -> Result<(), TrackerError> {
        debug!(path = %self.path.display(), "store closed");
        Ok(())
    }

    fn check_known(&self, id: &str) -> Result<(), TrackerError> {
        if self.catalog.contains(id) {
            Ok(())
        } else {
            Err(TrackerError::UnknownControl(id.to_string()))
        }
    }

    fn transact<F>(&self, op: &str, id: &str, mutate: F) -> Result<(), TrackerError>
    where
        F: FnOnce(&mut PersistedState),
    {
        self.ensure_parent()?;
        self.broker.with_lock(op, Some(id), |commit| {
            let mut state = match self.read_existing() {
                Ok(state) => state,
                Err(TrackerError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                    PersistedState::fresh()
                }
                Err(e) => return Err(e),
            };
            mutate(&mut state);
            state.touch();
            let bytes = encode(&state)?;
            broker::replace_atomically(&self.path, &bytes)?;
            commit.record(&bytes);
            Ok(())
        })
    }

    fn read_existing(&self) -> Result<PersistedState, TrackerError> {
        let raw = fs::read(&self.path)?;
        serde_json::from_slice(&raw).map_err(|e| TrackerError::CorruptState {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn ensure_parent(&self) -> Result<(), TrackerError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn encode(state: &PersistedState) -> Result<Vec<u8>, TrackerError> {
    let mut bytes = serde_json::to_vec_pretty(state)?;
    bytes.push(b'\n');
    Ok(bytes)
}
