use std::path::PathBuf;

/// Errors from the protection check-state store.
#[derive(Debug, thiserror::Error)]
pub enum ProtectionError {
    #[error("check state IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt check state: {0}")]
    CorruptState(#[from] serde_json::Error),
}

impl ProtectionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
