use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::media::{AttachmentId, MediaResolver};
use dashmap::DashMap;

/// An uploaded file known to the media library.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: AttachmentId,
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
    pub content_type: Option<String>,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// In-process media library. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MediaLibrary {
    next_id: AtomicU64,
    attachments: DashMap<AttachmentId, Attachment>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stored file and return its attachment.
    pub fn insert(&self, filename: String, path: PathBuf, url: String, size: u64) -> Attachment {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let content_type = mime_guess::from_path(&filename)
            .first()
            .map(|m| m.to_string());
        let attachment = Attachment {
            id,
            filename,
            path,
            url,
            content_type,
            size,
            uploaded_at: Utc::now(),
        };
        self.attachments.insert(id, attachment.clone());
        attachment
    }

    pub fn get(&self, id: AttachmentId) -> Option<Attachment> {
        self.attachments.get(&id).map(|a| a.value().clone())
    }

    /// Point an attachment at a new location, as when a file is moved after upload.
    pub fn relocate(&self, id: AttachmentId, path: PathBuf, url: String) -> Option<Attachment> {
        let mut entry = self.attachments.get_mut(&id)?;
        entry.path = path;
        entry.url = url;
        Some(entry.clone())
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

#[async_trait]
impl MediaResolver for MediaLibrary {
    async fn attachment_url(&self, id: AttachmentId) -> Option<String> {
        self.attachments.get(&id).map(|a| a.url.clone())
    }
}
