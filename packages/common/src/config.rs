use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

/// Where the site lives and where it stores uploads.
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Canonical origin of the site. Default: "http://localhost:3000/".
    #[serde(default = "default_home_url")]
    pub home_url: Url,
    /// Filesystem root for uploads. Default: "./uploads".
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Public URL of `upload_dir`. Default: `<home_url>/uploads`.
    #[serde(default)]
    pub upload_url: Option<Url>,
}

fn default_home_url() -> Url {
    Url::parse("http://localhost:3000/").expect("static URL is valid")
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

/// A site URL that cannot anchor the referrer condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiteConfigError {
    #[error("{field} must use http or https, got {scheme:?}")]
    UnsupportedScheme { field: &'static str, scheme: String },
    #[error("{field} must name a host")]
    MissingHost { field: &'static str },
    #[error("{field} must not carry a query or fragment")]
    QueryOrFragment { field: &'static str },
}

fn check_site_url(field: &'static str, url: &Url) -> Result<(), SiteConfigError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SiteConfigError::UnsupportedScheme {
            field,
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(SiteConfigError::MissingHost { field });
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(SiteConfigError::QueryOrFragment { field });
    }
    Ok(())
}

impl SiteConfig {
    /// Rejects site URLs that are not absolute http(s) locations.
    pub fn validate(&self) -> Result<(), SiteConfigError> {
        check_site_url("site.home_url", &self.home_url)?;
        if let Some(upload_url) = &self.upload_url {
            check_site_url("site.upload_url", upload_url)?;
        }
        Ok(())
    }

    /// Public base URL of the upload root, without a trailing slash.
    pub fn upload_base_url(&self) -> String {
        match &self.upload_url {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => format!("{}/uploads", self.home_url.as_str().trim_end_matches('/')),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            home_url: default_home_url(),
            upload_dir: default_upload_dir(),
            upload_url: None,
        }
    }
}

/// Which requests the referrer gate forbids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RulePolicy {
    /// Forbid every file in the directory.
    #[default]
    DenyAll,
    /// Forbid only files whose extension is listed (case-insensitive).
    DenyExtensions { extensions: Vec<String> },
}

/// Protected directory configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ProtectionConfig {
    /// Name of the protected subdirectory under the upload root. Default: "protected_uploads".
    #[serde(default = "default_directory_name")]
    pub directory_name: String,
    /// Rewrite rule policy. Default: deny all.
    #[serde(default)]
    pub rule_policy: RulePolicy,
    /// Name of the sentinel file. Default: "index.php".
    #[serde(default = "default_sentinel_file_name")]
    pub sentinel_file_name: String,
    /// How long a successful check stays valid. Default: 86400 (24 hours).
    #[serde(default = "default_check_ttl_secs")]
    pub check_ttl_secs: u64,
    /// How often the background scheduler wakes up. Default: 3600.
    #[serde(default = "default_scheduler_interval_secs")]
    pub scheduler_interval_secs: u64,
    /// File recording the last successful check. Default: "./data/protection_check.json".
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_directory_name() -> String {
    "protected_uploads".into()
}
fn default_sentinel_file_name() -> String {
    "index.php".into()
}
fn default_check_ttl_secs() -> u64 {
    24 * 60 * 60
}
fn default_scheduler_interval_secs() -> u64 {
    60 * 60
}
fn default_state_file() -> PathBuf {
    PathBuf::from("./data/protection_check.json")
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            directory_name: default_directory_name(),
            rule_policy: RulePolicy::default(),
            sentinel_file_name: default_sentinel_file_name(),
            check_ttl_secs: default_check_ttl_secs(),
            scheduler_interval_secs: default_scheduler_interval_secs(),
            state_file: default_state_file(),
        }
    }
}

/// The editor-facing file list field group.
#[derive(Debug, Deserialize, Clone)]
pub struct FieldConfig {
    /// Meta name of the repeater holding the rows. Default: "protected_media".
    #[serde(default = "default_group_name")]
    pub group_name: String,
    /// Identifier of the managed file field. Default: "field_protected_file".
    #[serde(default = "default_file_field_key")]
    pub file_field_key: String,
    /// Extensions accepted on upload. Empty accepts anything.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
    /// Whether every row must carry a file. Default: true.
    #[serde(default = "default_file_required")]
    pub file_required: bool,
}

fn default_group_name() -> String {
    "protected_media".into()
}
fn default_file_field_key() -> String {
    "field_protected_file".into()
}
fn default_file_required() -> bool {
    true
}

impl FieldConfig {
    /// Returns true if `filename` has an accepted extension.
    pub fn accepts_filename(&self, filename: &str) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return false;
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            group_name: default_group_name(),
            file_field_key: default_file_field_key(),
            allowed_extensions: Vec::new(),
            file_required: default_file_required(),
        }
    }
}
