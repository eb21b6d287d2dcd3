use async_trait::async_trait;

/// Identifier of an uploaded file in the media library.
pub type AttachmentId = u64;

/// Resolves attachment ids to their public URLs.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Public URL of the attachment, or `None` if the id is unknown.
    async fn attachment_url(&self, id: AttachmentId) -> Option<String>;
}
