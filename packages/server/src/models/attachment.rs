use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::media::Attachment;

/// Response DTO for an uploaded file.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AttachmentResponse {
    /// Attachment ID, referenced from file list rows.
    #[schema(example = 42)]
    pub id: u64,
    /// Stored filename, possibly suffixed to avoid a collision.
    #[schema(example = "handbook-1.pdf")]
    pub filename: String,
    /// Public URL of the stored file.
    #[schema(example = "https://example.com/uploads/protected_uploads/handbook-1.pdf")]
    pub url: String,
    /// MIME content type guessed from the extension.
    #[schema(example = "application/pdf")]
    pub content_type: Option<String>,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponse {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id,
            filename: attachment.filename,
            url: attachment.url,
            content_type: attachment.content_type,
            size: attachment.size,
            uploaded_at: attachment.uploaded_at,
        }
    }
}
