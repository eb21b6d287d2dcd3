use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::row_fields;

/// One row of a post's protected file list.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct FileRowInput {
    #[schema(example = "Member handbook")]
    pub title: Option<String>,
    pub desc: Option<String>,
    /// Attachment ID of a preview image.
    pub image: Option<u64>,
    /// Attachment ID of the protected file.
    #[schema(example = 42)]
    pub file: Option<u64>,
}

impl FileRowInput {
    /// Meta values for this row. Blank text is stored as absent.
    pub fn into_meta(self) -> Map<String, Value> {
        let text = |s: Option<String>| s.filter(|s| !s.trim().is_empty()).map(Value::String);
        let mut row = Map::new();
        row.insert(
            row_fields::TITLE.into(),
            text(self.title).unwrap_or(Value::Null),
        );
        row.insert(
            row_fields::DESC.into(),
            text(self.desc).unwrap_or(Value::Null),
        );
        row.insert(
            row_fields::IMAGE.into(),
            self.image.map(Value::from).unwrap_or(Value::Null),
        );
        row.insert(
            row_fields::FILE.into(),
            self.file.map(Value::from).unwrap_or(Value::Null),
        );
        row
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SaveFilesRequest {
    pub rows: Vec<FileRowInput>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SaveFilesResponse {
    #[schema(example = 7)]
    pub post_id: u64,
    /// Number of rows stored.
    #[schema(example = 2)]
    pub rows: usize,
}

/// A file list entry as shown to visitors.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileEntry {
    /// Row title, or the file's basename when the row has none.
    #[schema(example = "Member handbook")]
    pub title: String,
    pub desc: Option<String>,
    #[schema(example = 42)]
    pub file_id: u64,
    #[schema(example = "https://example.com/uploads/protected_uploads/handbook.pdf")]
    pub file_url: String,
    /// Extension of the file URL, e.g. "pdf".
    #[schema(example = "pdf")]
    pub extension: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostFilesResponse {
    pub post_id: u64,
    pub files: Vec<FileEntry>,
}
