use chrono::{DateTime, Utc};
use common::protection::{ProtectionChange, ProtectionFile, ReconcileOutcome, WriteFailure};
use serde::Serialize;

/// Current state of the protected directory.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProtectionStatusResponse {
    #[schema(example = "protected_uploads")]
    pub directory_name: String,
    #[schema(example = "./uploads/protected_uploads")]
    pub directory_path: String,
    #[schema(example = "https://example.com/uploads/protected_uploads")]
    pub directory_url: String,
    /// Rule text the directory's `.htaccess` should hold.
    pub expected_rules: String,
    /// Last successful verification, if any.
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WriteFailureResponse {
    /// One of `directory`, `rules`, `sentinel`.
    #[schema(example = "rules")]
    pub file: String,
    pub error: String,
}

/// Result of a reconcile pass.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ReconcileResponse {
    /// One of `fresh`, `verified`, `failed`.
    #[schema(example = "verified")]
    pub status: &'static str,
    /// Set when the pass was skipped because the last check is still fresh.
    pub last_checked: Option<DateTime<Utc>>,
    /// Repairs made, e.g. `created_rules`, `repaired_rules`.
    pub changes: Vec<String>,
    pub failures: Vec<WriteFailureResponse>,
}

fn change_name(change: ProtectionChange) -> String {
    match change {
        ProtectionChange::CreatedDirectory => "created_directory",
        ProtectionChange::CreatedRules => "created_rules",
        ProtectionChange::RepairedRules => "repaired_rules",
        ProtectionChange::CreatedSentinel => "created_sentinel",
    }
    .to_string()
}

impl From<WriteFailure> for WriteFailureResponse {
    fn from(failure: WriteFailure) -> Self {
        let file = match failure.file {
            ProtectionFile::Directory => "directory",
            ProtectionFile::Rules => "rules",
            ProtectionFile::Sentinel => "sentinel",
        };
        Self {
            file: file.to_string(),
            error: failure.error,
        }
    }
}

impl From<ReconcileOutcome> for ReconcileResponse {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Fresh { last_checked } => Self {
                status: "fresh",
                last_checked: Some(last_checked),
                changes: Vec::new(),
                failures: Vec::new(),
            },
            ReconcileOutcome::Verified { changes } => Self {
                status: "verified",
                last_checked: None,
                changes: changes.into_iter().map(change_name).collect(),
                failures: Vec::new(),
            },
            ReconcileOutcome::Failed { changes, failures } => Self {
                status: "failed",
                last_checked: None,
                changes: changes.into_iter().map(change_name).collect(),
                failures: failures.into_iter().map(Into::into).collect(),
            },
        }
    }
}
