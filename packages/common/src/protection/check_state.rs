use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use super::error::ProtectionError;

/// When the protection files were last verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionCheckState {
    pub last_checked: DateTime<Utc>,
}

impl ProtectionCheckState {
    pub fn now() -> Self {
        Self {
            last_checked: Utc::now(),
        }
    }

    /// A check is fresh while younger than `ttl`. Timestamps from the future
    /// (clock skew between hosts) are treated as expired.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = now - self.last_checked;
        age >= Duration::zero() && age < ttl
    }
}

/// Shared slot holding the last check timestamp.
///
/// Writers race freely: a stale or early recheck only costs one extra pass.
#[async_trait]
pub trait CheckStateStore: Send + Sync {
    async fn load(&self) -> Result<Option<ProtectionCheckState>, ProtectionError>;
    async fn store(&self, state: ProtectionCheckState) -> Result<(), ProtectionError>;
}

#[derive(Debug, Default)]
pub struct MemoryCheckStateStore {
    state: RwLock<Option<ProtectionCheckState>>,
}

impl MemoryCheckStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ProtectionCheckState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
        }
    }
}

#[async_trait]
impl CheckStateStore for MemoryCheckStateStore {
    async fn load(&self) -> Result<Option<ProtectionCheckState>, ProtectionError> {
        Ok(*self.state.read().await)
    }

    async fn store(&self, state: ProtectionCheckState) -> Result<(), ProtectionError> {
        *self.state.write().await = Some(state);
        Ok(())
    }
}

/// JSON file store, written through a temp file and rename.
#[derive(Debug)]
pub struct FileCheckStateStore {
    path: PathBuf,
}

impl FileCheckStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4()));
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckStateStore for FileCheckStateStore {
    async fn load(&self) -> Result<Option<ProtectionCheckState>, ProtectionError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProtectionError::io(&self.path, e)),
        }
    }

    async fn store(&self, state: ProtectionCheckState) -> Result<(), ProtectionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ProtectionError::io(parent, e))?;
        }

        let bytes = serde_json::to_vec(&state)?;
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ProtectionError::io(&temp_path, e));
        }
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ProtectionError::io(&self.path, e));
        }
        Ok(())
    }
}
