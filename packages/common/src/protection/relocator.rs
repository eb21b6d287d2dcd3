use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::event::{Event, field_topic};
use crate::hook::{Hook, HookAction};

/// Where an upload in flight will be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub base_dir: PathBuf,
    pub base_url: String,
}

/// Fired before an upload's storage location is finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDirEvent {
    pub field_key: String,
    pub target: UploadTarget,
}

impl Event for UploadDirEvent {
    fn topic(&self) -> String {
        field_topic("upload_dir", &self.field_key)
    }
}

/// Points uploads for one field at the protected directory.
///
/// Only repoints; content is not inspected and nothing is rejected.
pub struct UploadRelocator {
    field_key: String,
    segment: String,
}

impl UploadRelocator {
    pub fn new(field_key: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            field_key: field_key.into(),
            segment: segment.into(),
        }
    }

    pub fn relocate(&self, proposed: &UploadTarget) -> UploadTarget {
        UploadTarget {
            base_dir: proposed.base_dir.join(&self.segment),
            base_url: format!(
                "{}/{}",
                proposed.base_url.trim_end_matches('/'),
                self.segment
            ),
        }
    }
}

#[async_trait]
impl Hook<UploadDirEvent> for UploadRelocator {
    fn id(&self) -> &str {
        "upload_relocator"
    }

    fn topics(&self) -> Vec<String> {
        vec![field_topic("upload_dir", &self.field_key)]
    }

    async fn on_event(&self, e: &UploadDirEvent) -> anyhow::Result<HookAction<UploadDirEvent>> {
        Ok(HookAction::Modified(UploadDirEvent {
            field_key: e.field_key.clone(),
            target: self.relocate(&e.target),
        }))
    }
}
