//! Coalesced workspace persistence.
//!
//! The controller asks for a save after every viewport or tool change; the
//! manager turns those requests into at most one write per interval.

use crate::storage::{FileStorage, Storage, StorageError, StorageResult};
use crate::workspace::Workspace;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default minimum time between two saves, in milliseconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 500;

/// Storage key of the workspace.
pub const WORKSPACE_KEY: &str = "workspace";

/// Manages automatic workspace persistence.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    /// Whether the workspace has unsaved changes.
    dirty: bool,
}

impl<S: Storage> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_millis(DEFAULT_AUTOSAVE_INTERVAL_MS),
            last_save: None,
            dirty: false,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Record that the workspace changed since the last save.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Check if the workspace is dirty and the interval has passed.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save the workspace if needed. Returns true if a save was performed.
    pub async fn maybe_save(&mut self, workspace: &Workspace) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(workspace).await?;
        Ok(true)
    }

    /// Save the workspace immediately.
    pub async fn save(&mut self, workspace: &Workspace) -> StorageResult<()> {
        let json = workspace
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.save(WORKSPACE_KEY, &json).await?;
        self.last_save = Some(Instant::now());
        self.dirty = false;
        Ok(())
    }

    /// Restore the stored workspace, or create and save a new one.
    ///
    /// Missing or unusable fields of a stored workspace fall back to the
    /// defaults for a screen of `screen_height`.
    pub async fn load_workspace(&mut self, screen_height: f64) -> StorageResult<Workspace> {
        let defaults = Workspace::new(screen_height);
        match self.storage.load(WORKSPACE_KEY).await {
            Ok(json) => match Workspace::restore(&json, defaults) {
                Ok(workspace) => {
                    log::info!("Restored previous workspace");
                    self.dirty = false;
                    return Ok(workspace);
                }
                Err(e) => log::warn!("Discarding stored workspace: {}", e),
            },
            Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        log::info!("Created new workspace");
        self.save(&defaults).await?;
        Ok(defaults)
    }
}

/// Storage backend used by the native application.
pub type PlatformStorage = FileStorage;

/// Create file storage in the platform data directory.
pub fn create_default_storage() -> StorageResult<Arc<PlatformStorage>> {
    Ok(Arc::new(FileStorage::default_location()?))
}
