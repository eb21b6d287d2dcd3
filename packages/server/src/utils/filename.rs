use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};

/// Why an uploaded filename was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    Empty,
    /// Contains `/` or `\`.
    PathSeparator,
    /// Exactly `..`.
    PathTraversal,
    /// Starts with a dot. Would shadow `.htaccess` and friends.
    Hidden,
    /// Contains NUL, CR, LF or other ASCII control characters.
    ControlCharacter,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::PathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat filename (no directory components) and returns it trimmed.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if trimmed.contains(['/', '\\']) {
        return Err(FilenameError::PathSeparator);
    }
    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }
    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Splits `report.final.pdf` into `("report.final", Some("pdf"))`.
fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    }
}

/// `name.pdf`, `name-1.pdf`, `name-2.pdf`, ...
fn numbered(filename: &str, n: usize) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match split_extension(filename) {
        (stem, Some(ext)) => format!("{stem}-{n}.{ext}"),
        (stem, None) => format!("{stem}-{n}"),
    }
}

/// A freshly created, empty file claimed under a unique name.
#[derive(Debug)]
pub struct ReservedFile {
    pub name: String,
    pub path: PathBuf,
    pub file: File,
}

/// Creates the first free name in `dir`. Creation is exclusive, so
/// concurrent callers never receive the same name.
pub async fn reserve_filename(dir: &Path, filename: &str) -> io::Result<ReservedFile> {
    let mut n = 0;
    loop {
        let name = numbered(filename, n);
        let path = dir.join(&name);
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok(ReservedFile { name, path, file }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}
