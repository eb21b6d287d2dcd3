use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

use super::check_state::{CheckStateStore, ProtectionCheckState};
use super::directory::{ProtectedDirectory, SentinelFile};
use super::rules::generate_rules;
use crate::config::{ProtectionConfig, RulePolicy, SiteConfig};

/// One of the on-disk pieces the reconciler maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionFile {
    Directory,
    Rules,
    Sentinel,
}

impl fmt::Display for ProtectionFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => f.write_str("directory"),
            Self::Rules => f.write_str("rules file"),
            Self::Sentinel => f.write_str("sentinel file"),
        }
    }
}

/// A repair performed during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionChange {
    CreatedDirectory,
    CreatedRules,
    RepairedRules,
    CreatedSentinel,
}

/// A best-effort write that did not land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub file: ProtectionFile,
    pub error: String,
}

/// Result of a reconcile call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The last check is still within its TTL; nothing was touched.
    Fresh { last_checked: DateTime<Utc> },
    /// On-disk state matches expectations. `changes` is empty when nothing drifted.
    Verified { changes: Vec<ProtectionChange> },
    /// Something could not be written or verified. The check time was not
    /// recorded, so the next call retries.
    Failed {
        changes: Vec<ProtectionChange>,
        failures: Vec<WriteFailure>,
    },
}

impl ReconcileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Keeps the protected directory's rule and sentinel files in sync.
///
/// Every step is idempotent and independently retried: a pass that fails half
/// way is completed by the next one. Filesystem errors never escape; they are
/// logged and reported in the [`ReconcileOutcome`].
pub struct Reconciler {
    directory: ProtectedDirectory,
    sentinel: SentinelFile,
    origin: Url,
    policy: RulePolicy,
    state: Arc<dyn CheckStateStore>,
    ttl: Duration,
}

impl Reconciler {
    pub fn new(
        directory: ProtectedDirectory,
        sentinel: SentinelFile,
        origin: Url,
        policy: RulePolicy,
        state: Arc<dyn CheckStateStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            directory,
            sentinel,
            origin,
            policy,
            state,
            ttl,
        }
    }

    pub fn from_config(
        site: &SiteConfig,
        protection: &ProtectionConfig,
        state: Arc<dyn CheckStateStore>,
    ) -> Self {
        Self::new(
            ProtectedDirectory::from_config(site, protection),
            SentinelFile::new(protection.sentinel_file_name.clone()),
            site.home_url.clone(),
            protection.rule_policy.clone(),
            state,
            ttl_from_secs(protection.check_ttl_secs),
        )
    }

    pub fn directory(&self) -> &ProtectedDirectory {
        &self.directory
    }

    /// The rule text the directory should currently hold.
    pub fn expected_rules(&self) -> String {
        generate_rules(&self.origin, &self.policy)
    }

    /// Last recorded successful check, if any. Store errors read as "never".
    pub async fn last_checked(&self) -> Option<DateTime<Utc>> {
        match self.state.load().await {
            Ok(state) => state.map(|s| s.last_checked),
            Err(e) => {
                warn!(error = %e, "Failed to read protection check state");
                None
            }
        }
    }

    /// Bring the protection files in line with the current configuration.
    ///
    /// Without `force`, returns [`ReconcileOutcome::Fresh`] while the last
    /// successful check is younger than the TTL.
    pub async fn reconcile(&self, force: bool) -> ReconcileOutcome {
        if !force {
            if let Some(last_checked) = self.fresh_check().await {
                debug!(%last_checked, "Protection files checked recently, skipping");
                return ReconcileOutcome::Fresh { last_checked };
            }
        }

        let mut changes = Vec::new();
        let mut failures = Vec::new();
        let dir = self.directory.path();

        let is_dir = fs::metadata(dir).await.is_ok_and(|m| m.is_dir());
        if !is_dir {
            match fs::create_dir_all(dir).await {
                Ok(()) => {
                    info!(directory = %dir.display(), "Created protected directory");
                    changes.push(ProtectionChange::CreatedDirectory);
                }
                Err(e) => {
                    warn!(directory = %dir.display(), error = %e, "Failed to create protected directory");
                    failures.push(WriteFailure {
                        file: ProtectionFile::Directory,
                        error: e.to_string(),
                    });
                    return ReconcileOutcome::Failed { changes, failures };
                }
            }
        }

        let expected = self.expected_rules();
        self.sync_rules(&expected, &mut changes, &mut failures).await;
        self.sync_sentinel(&mut changes, &mut failures).await;

        if failures.is_empty() && !self.verify(&expected).await {
            failures.push(WriteFailure {
                file: ProtectionFile::Rules,
                error: "on-disk state does not match after reconciliation".into(),
            });
        }

        if !failures.is_empty() {
            return ReconcileOutcome::Failed { changes, failures };
        }

        if let Err(e) = self.state.store(ProtectionCheckState::now()).await {
            warn!(error = %e, "Failed to record protection check time");
        }
        ReconcileOutcome::Verified { changes }
    }

    async fn fresh_check(&self) -> Option<DateTime<Utc>> {
        let last_checked = self.last_checked().await?;
        let state = ProtectionCheckState { last_checked };
        state
            .is_fresh(Utc::now(), self.ttl)
            .then_some(last_checked)
    }

    async fn sync_rules(
        &self,
        expected: &str,
        changes: &mut Vec<ProtectionChange>,
        failures: &mut Vec<WriteFailure>,
    ) {
        let path = self.directory.rules_path();
        let change = match fs::read_to_string(&path).await {
            Ok(current) if current == expected => return,
            Ok(_) => ProtectionChange::RepairedRules,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProtectionChange::CreatedRules,
            // Unreadable content is treated as drift and overwritten.
            Err(_) => ProtectionChange::RepairedRules,
        };

        match fs::write(&path, expected).await {
            Ok(()) => {
                info!(path = %path.display(), ?change, "Wrote protection rules");
                changes.push(change);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write protection rules");
                failures.push(WriteFailure {
                    file: ProtectionFile::Rules,
                    error: e.to_string(),
                });
            }
        }
    }

    async fn sync_sentinel(
        &self,
        changes: &mut Vec<ProtectionChange>,
        failures: &mut Vec<WriteFailure>,
    ) {
        let path = self.sentinel.path_in(&self.directory);
        if is_file(&path).await {
            return;
        }

        match fs::write(&path, self.sentinel.contents()).await {
            Ok(()) => {
                info!(path = %path.display(), "Created sentinel file");
                changes.push(ProtectionChange::CreatedSentinel);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to create sentinel file");
                failures.push(WriteFailure {
                    file: ProtectionFile::Sentinel,
                    error: e.to_string(),
                });
            }
        }
    }

    async fn verify(&self, expected: &str) -> bool {
        let rules_ok = fs::read_to_string(self.directory.rules_path())
            .await
            .is_ok_and(|current| current == expected);
        let sentinel_ok = is_file(&self.sentinel.path_in(&self.directory)).await;
        rules_ok && sentinel_ok
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// Converts a configured TTL, saturating at the largest representable span.
fn ttl_from_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}
