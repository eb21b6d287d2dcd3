use common::config::FieldConfig;
use common::fields::{FieldSchema, MetaSource, flatten_rows};
use dashmap::DashMap;
use serde_json::{Map, Value};

/// Post identifier.
pub type PostId = u64;

/// Names of the sub-fields of one file list row.
pub mod row_fields {
    pub const TITLE: &str = "title";
    pub const DESC: &str = "desc";
    pub const IMAGE: &str = "image";
    pub const FILE: &str = "file";
}

/// Declared shape of the file list field group.
pub fn file_list_schema(fields: &FieldConfig) -> Vec<FieldSchema> {
    vec![FieldSchema::repeater(
        fields.group_name.clone(),
        vec![
            FieldSchema::leaf(row_fields::TITLE),
            FieldSchema::leaf(row_fields::DESC),
            FieldSchema::leaf(row_fields::IMAGE),
            FieldSchema::leaf(row_fields::FILE),
        ],
    )]
}

/// Flat per-post meta storage.
#[derive(Default)]
pub struct PostMetaStore {
    posts: DashMap<PostId, Map<String, Value>>,
}

impl PostMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every stored row of repeater `name` on `post_id` with `rows`.
    pub fn replace_rows(&self, post_id: PostId, name: &str, rows: &[Map<String, Value>]) {
        let mut meta = self.posts.entry(post_id).or_default();
        let row_prefix = format!("{name}_");
        meta.retain(|key, _| key != name && !is_row_key(key, &row_prefix));
        meta.extend(flatten_rows(name, rows));
    }

    /// A point-in-time view of one post's meta.
    pub fn post(&self, post_id: PostId) -> Option<PostMeta> {
        self.posts
            .get(&post_id)
            .map(|meta| PostMeta(meta.value().clone()))
    }
}

/// `files_3_title` belongs to `files`; `files_extra` does not.
fn is_row_key(key: &str, row_prefix: &str) -> bool {
    key.strip_prefix(row_prefix)
        .and_then(|rest| rest.split_once('_'))
        .is_some_and(|(index, _)| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Snapshot of a post's meta, readable through a field schema.
pub struct PostMeta(Map<String, Value>);

impl MetaSource for PostMeta {
    fn meta(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }
}
