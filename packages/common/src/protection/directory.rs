use std::path::{Path, PathBuf};

use crate::config::{ProtectionConfig, SiteConfig};

/// Name of the rewrite rule file the web server reads.
pub const RULES_FILE_NAME: &str = ".htaccess";

/// The protected upload subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedDirectory {
    name: String,
    path: PathBuf,
    url: String,
}

impl ProtectedDirectory {
    pub fn new(name: impl Into<String>, upload_dir: &Path, upload_base_url: &str) -> Self {
        let name = name.into();
        Self {
            path: upload_dir.join(&name),
            url: format!("{}/{}", upload_base_url.trim_end_matches('/'), name),
            name,
        }
    }

    pub fn from_config(site: &SiteConfig, protection: &ProtectionConfig) -> Self {
        Self::new(
            protection.directory_name.clone(),
            &site.upload_dir,
            &site.upload_base_url(),
        )
    }

    /// Distinguishing path segment, e.g. "protected_uploads".
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn rules_path(&self) -> PathBuf {
        self.path.join(RULES_FILE_NAME)
    }

    /// Membership is substring containment of the directory name, not a prefix
    /// match, so CDN-rewritten URLs still count.
    pub fn contains_url(&self, url: &str) -> bool {
        url.contains(&self.name)
    }
}

/// Marker file that stops the server from listing the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelFile {
    file_name: String,
}

impl SentinelFile {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path_in(&self, directory: &ProtectedDirectory) -> PathBuf {
        directory.path().join(&self.file_name)
    }

    /// Fixed content, a "Silence is golden." comment in the file's own syntax.
    pub fn contents(&self) -> &'static str {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("php") => "<?php\n// Silence is golden.",
            Some("html") | Some("htm") => "<!-- Silence is golden. -->",
            _ => "",
        }
    }
}

impl Default for SentinelFile {
    fn default() -> Self {
        Self::new("index.php")
    }
}
