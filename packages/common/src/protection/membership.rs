use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::directory::ProtectedDirectory;
use crate::event::{Event, field_topic};
use crate::hook::{Hook, HookAction};
use crate::media::{AttachmentId, MediaResolver};

/// Validity of a field value as it moves through the validation chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum Validity {
    Valid,
    Invalid(String),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Fired once per file field value when a record is saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateValueEvent {
    pub field_key: String,
    pub value: Option<AttachmentId>,
    pub valid: Validity,
}

impl Event for ValidateValueEvent {
    fn topic(&self) -> String {
        field_topic("validate_value", &self.field_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("Attachment {0} does not exist. Please upload a new file.")]
    UnknownAttachment(AttachmentId),

    #[error(
        "This file is not in the {directory} directory and may not be protected. \
         Please upload a new file or choose one from the {directory} directory."
    )]
    OutsideProtectedDirectory { directory: String, url: String },
}

/// Rejects file references that do not resolve into the protected directory.
///
/// Catches files chosen from the existing library, or moved after upload,
/// which never went through the upload relocator.
pub struct MembershipValidator {
    field_key: String,
    directory: ProtectedDirectory,
    media: Arc<dyn MediaResolver>,
}

impl MembershipValidator {
    pub fn new(
        field_key: impl Into<String>,
        directory: ProtectedDirectory,
        media: Arc<dyn MediaResolver>,
    ) -> Self {
        Self {
            field_key: field_key.into(),
            directory,
            media,
        }
    }

    pub async fn validate(&self, id: AttachmentId) -> Result<(), MembershipError> {
        let url = self
            .media
            .attachment_url(id)
            .await
            .ok_or(MembershipError::UnknownAttachment(id))?;

        if self.directory.contains_url(&url) {
            Ok(())
        } else {
            debug!(attachment_id = id, %url, "File outside protected directory");
            Err(MembershipError::OutsideProtectedDirectory {
                directory: self.directory.name().to_string(),
                url,
            })
        }
    }
}

#[async_trait]
impl Hook<ValidateValueEvent> for MembershipValidator {
    fn id(&self) -> &str {
        "membership_validator"
    }

    fn topics(&self) -> Vec<String> {
        vec![field_topic("validate_value", &self.field_key)]
    }

    async fn on_event(
        &self,
        e: &ValidateValueEvent,
    ) -> anyhow::Result<HookAction<ValidateValueEvent>> {
        // Earlier checks already failed, or there is nothing to check.
        let (Validity::Valid, Some(id)) = (&e.valid, e.value) else {
            return Ok(HookAction::Pass);
        };

        Ok(match self.validate(id).await {
            Ok(()) => HookAction::Pass,
            Err(err) => HookAction::Modified(ValidateValueEvent {
                valid: Validity::Invalid(err.to_string()),
                ..e.clone()
            }),
        })
    }
}
