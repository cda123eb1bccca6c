// ── Snapshot backends ──
//
// JSON file persistence for production, shared-memory for tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::{SnapshotBackend, SubscriptionSnapshot};
use crate::error::CoreError;

/// Stores the snapshot as pretty-printed JSON at a fixed path.
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotBackend for JsonSnapshot {
    fn load(&self) -> Result<Option<SubscriptionSnapshot>, CoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::Persistence {
                    reason: format!("cannot read {}: {e}", self.path.display()),
                });
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CoreError::Persistence {
                reason: format!("corrupt snapshot at {}: {e}", self.path.display()),
            })
    }

    fn save(&self, snapshot: &SubscriptionSnapshot) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::Persistence {
                reason: format!("cannot create {}: {e}", parent.display()),
            })?;
        }

        let raw = serde_json::to_string_pretty(snapshot).map_err(|e| CoreError::Persistence {
            reason: format!("serialization failed: {e}"),
        })?;

        std::fs::write(&self.path, raw).map_err(|e| CoreError::Persistence {
            reason: format!("cannot write {}: {e}", self.path.display()),
        })?;

        debug!(path = %self.path.display(), "subscription snapshot written");
        Ok(())
    }
}

/// Shared in-memory backend. Cloned handles see the same snapshot --
/// used by tests to simulate reopen-after-restart.
#[derive(Default, Clone)]
pub struct MemorySnapshot {
    cell: Arc<Mutex<Option<SubscriptionSnapshot>>>,
}

impl MemorySnapshot {
    /// Another handle onto the same underlying snapshot.
    pub fn share(&self) -> Self {
        self.clone()
    }
}

impl SnapshotBackend for MemorySnapshot {
    fn load(&self) -> Result<Option<SubscriptionSnapshot>, CoreError> {
        Ok(self
            .cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, snapshot: &SubscriptionSnapshot) -> Result<(), CoreError> {
        *self.cell.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(())
    }
}
