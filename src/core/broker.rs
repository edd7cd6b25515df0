use crate::core::error::TrackerError;
use crate::core::time;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const LOCK_ATTEMPTS: u32 = 40;
const LOCK_RETRY: Duration = Duration::from_millis(50);

/// The state broker is the only path by which the state file is mutated.
/// Every read-modify-write cycle runs under an in-process mutex and a
/// `<state>.lock` file, so two writers can never interleave.
pub struct StateBroker {
    lock_path: PathBuf,
    audit_log_path: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub op: String,
    pub control_id: Option<String>,
    pub status: String,
    pub state_sha256: Option<String>,
}

/// Filled in by the mutation when it replaces the state file.
#[derive(Debug, Default)]
pub struct CommitInfo {
    pub state_sha256: Option<String>,
}

impl CommitInfo {
    pub fn record(&mut self, bytes: &[u8]) {
        self.state_sha256 = Some(sha256_hex(bytes));
    }
}

pub fn lock_path_for(state_path: &Path) -> PathBuf {
    sibling_with_suffix(state_path, ".lock")
}

pub fn audit_log_path_for(state_path: &Path) -> PathBuf {
    sibling_with_suffix(state_path, ".events.jsonl")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

impl StateBroker {
    pub fn new(state_path: &Path, audit_log: bool) -> Self {
        Self {
            lock_path: lock_path_for(state_path),
            audit_log_path: audit_log.then(|| audit_log_path_for(state_path)),
        }
    }

    pub fn audit_log_path(&self) -> Option<&Path> {
        self.audit_log_path.as_deref()
    }

    /// Execute a mutation with exclusive access to the state file.
    pub fn with_lock<F, R>(&self, op: &str, control_id: Option<&str>, f: F) -> Result<R, TrackerError>
    where
        F: FnOnce(&mut CommitInfo) -> Result<R, TrackerError>,
    {
        static STATE_LOCK: Mutex<()> = Mutex::new(());
        let _guard = STATE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let _file_lock = LockFile::acquire(&self.lock_path)?;
        debug!(op, lock = %self.lock_path.display(), "state lock acquired");

        let mut commit = CommitInfo::default();
        let result = f(&mut commit);

        // The mutation's outcome stands whatever happens to the audit append.
        let status = if result.is_ok() { "success" } else { "error" };
        if let Err(e) = self.log_event(op, control_id, status, commit.state_sha256) {
            warn!(op, error = %e, "audit log append failed");
        }

        result
    }

    fn log_event(
        &self,
        op: &str,
        control_id: Option<&str>,
        status: &str,
        state_sha256: Option<String>,
    ) -> Result<(), TrackerError> {
        let Some(path) = &self.audit_log_path else {
            return Ok(());
        };

        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            op: op.to_string(),
            control_id: control_id.map(|s| s.to_string()),
            status: status.to_string(),
            state_sha256,
        };

        let mut f = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(f, "{}", serde_json::to_string(&ev)?)?;
        Ok(())
    }
}

/// Read every event of an audit log. A missing log is empty.
pub fn read_events(path: &Path) -> Result<Vec<BrokerEvent>, TrackerError> {
    let f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut events = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(serde_json::from_str(&line)?);
    }
    Ok(events)
}

/// Replace `path` with `bytes` so that a crash leaves either the old or the
/// new document, never a truncated one.
pub fn replace_atomically(path: &Path, bytes: &[u8]) -> Result<(), TrackerError> {
    let tmp = sibling_tmp(path);
    {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn sibling_tmp(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: &Path) -> Result<Self, TrackerError> {
        for attempt in 0..LOCK_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut f) => {
                    let lock = Self {
                        path: path.to_path_buf(),
                    };
                    writeln!(f, "{}", std::process::id())?;
                    return Ok(lock);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(attempt, "state lock busy, retrying");
                    thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(e.into()),
            }
        }
        warn!(lock = %path.display(), "gave up waiting for state lock");
        Err(TrackerError::StateLocked(path.to_path_buf()))
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
