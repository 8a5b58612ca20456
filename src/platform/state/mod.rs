//! Durable run state of one bot instance.
//!
//! A single mutex serializes every read and write. Each mutation rewrites
//! the whole JSON file; a failed write is logged and the in-memory state
//! stays authoritative for the rest of the process lifetime.

mod record;

pub use record::{
    ActionRecord, LoadDiagnostics, RunState, TIMESTAMP_FORMAT, decode_persisted, local_now,
};

use crate::error::LikeError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Field changes applied atomically by [`StateStore::update`].
///
/// The four `last_action*` fields travel together in one [`ActionRecord`],
/// so a patch can never update them partially.
#[derive(Debug, Clone, Default)]
pub struct RunStatePatch {
    pub schedule_enabled: Option<bool>,
    pub action: Option<ActionRecord>,
}

#[derive(Debug)]
pub struct StateStore {
    path: Option<PathBuf>,
    state: Mutex<RunState>,
}

impl StateStore {
    /// Memory-only store; nothing survives a restart.
    pub fn in_memory(initial: RunState) -> Self {
        Self {
            path: None,
            state: Mutex::new(initial),
        }
    }

    /// Loads `path` over `defaults`. A missing file is created from the
    /// defaults; unreadable or malformed content is logged and ignored.
    pub fn open(path: Option<PathBuf>, defaults: RunState) -> Self {
        let Some(path) = path else {
            return Self::in_memory(defaults);
        };

        let state = match fs::read_to_string(&path) {
            Ok(raw) => {
                let (state, diagnostics) = decode_persisted(&raw, &defaults);
                for problem in diagnostics.iter() {
                    tracing::warn!(path = %path.display(), %problem, "ignored persisted state field");
                }
                state
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Err(error) = write_state(&path, &defaults) {
                    tracing::warn!(%error, "failed to create state file");
                }
                defaults
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to read state file, using defaults");
                defaults
            }
        };

        Self {
            path: Some(path),
            state: Mutex::new(state),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn get(&self) -> RunState {
        self.lock().clone()
    }

    pub fn update(&self, patch: RunStatePatch) -> RunState {
        let mut state = self.lock();
        if let Some(enabled) = patch.schedule_enabled {
            state.schedule_enabled = enabled;
        }
        if let Some(action) = patch.action {
            state.apply_action(action);
        }
        self.persist_locked(&state);
        state.clone()
    }

    pub fn set_schedule_enabled(&self, enabled: bool) -> RunState {
        self.update(RunStatePatch {
            schedule_enabled: Some(enabled),
            action: None,
        })
    }

    pub fn record_action(&self, action: ActionRecord) -> RunState {
        self.update(RunStatePatch {
            schedule_enabled: None,
            action: Some(action),
        })
    }

    fn persist_locked(&self, state: &RunState) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(error) = write_state(path, state) {
            tracing::warn!(%error, "state kept in memory only");
        }
    }
}

/// Full rewrite through a sibling temp file, so readers never see a
/// half-written document.
fn write_state(path: &Path, state: &RunState) -> Result<(), LikeError> {
    let failure = |message: String| LikeError::Persistence {
        path: path.display().to_string(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| failure(e.to_string()))?;
    }
    let data = serde_json::to_vec_pretty(state).map_err(|e| failure(e.to_string()))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data).map_err(|e| failure(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| failure(e.to_string()))
}
