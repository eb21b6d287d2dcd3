//! Schema-driven reader for nested custom fields stored as flat meta.
//!
//! Rows of a repeater named `files` are stored as `files` (row count) plus
//! `files_0_title`, `files_0_file`, `files_1_title`, ... Flexible groups store
//! an ordered list of layout names instead of a count. The reader walks a
//! declared schema, so recursion is bounded by schema depth, not by data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared shape of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSchema {
    Leaf {
        name: String,
    },
    Repeater {
        name: String,
        sub_fields: Vec<FieldSchema>,
    },
    Flexible {
        name: String,
        layouts: Vec<LayoutSchema>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSchema {
    pub name: String,
    pub sub_fields: Vec<FieldSchema>,
}

impl FieldSchema {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::Leaf { name: name.into() }
    }

    pub fn repeater(name: impl Into<String>, sub_fields: Vec<FieldSchema>) -> Self {
        Self::Repeater {
            name: name.into(),
            sub_fields,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Leaf { name } | Self::Repeater { name, .. } | Self::Flexible { name, .. } => name,
        }
    }
}

/// Key under which a flexible row records its layout.
pub const LAYOUT_KEY: &str = "layout";

/// Flat key/value storage a record's fields are read from.
pub trait MetaSource {
    fn meta(&self, key: &str) -> Option<Value>;
}

impl MetaSource for std::collections::HashMap<String, Value> {
    fn meta(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

/// Read every field declared in `schema` into a structured object.
pub fn read_fields(source: &impl MetaSource, schema: &[FieldSchema]) -> Map<String, Value> {
    read_with_prefix(source, schema, "")
}

fn read_with_prefix(
    source: &impl MetaSource,
    schema: &[FieldSchema],
    prefix: &str,
) -> Map<String, Value> {
    let mut results = Map::new();

    for field in schema {
        let name = field.name();
        if name.is_empty() {
            continue;
        }
        let meta_key = format!("{prefix}{name}");
        let value = source.meta(&meta_key);

        match field {
            FieldSchema::Leaf { .. } => {
                results.insert(name.to_string(), value.unwrap_or(Value::Null));
            }
            FieldSchema::Repeater { sub_fields, .. } => {
                let count = value.as_ref().and_then(row_count).unwrap_or(0);
                if count == 0 || sub_fields.is_empty() {
                    continue;
                }
                let rows = (0..count)
                    .map(|i| {
                        let row_prefix = format!("{meta_key}_{i}_");
                        Value::Object(read_with_prefix(source, sub_fields, &row_prefix))
                    })
                    .collect();
                results.insert(name.to_string(), Value::Array(rows));
            }
            FieldSchema::Flexible { layouts, .. } => {
                let Some(Value::Array(row_layouts)) = value else {
                    continue;
                };
                let mut rows = Vec::new();
                for (i, layout_name) in row_layouts.iter().enumerate() {
                    let Some(layout_name) = layout_name.as_str() else {
                        continue;
                    };
                    // Rows whose layout is no longer declared are dropped.
                    let Some(layout) = layouts.iter().find(|l| l.name == layout_name) else {
                        continue;
                    };
                    if layout.sub_fields.is_empty() {
                        continue;
                    }
                    let row_prefix = format!("{meta_key}_{i}_");
                    let mut row = Map::new();
                    row.insert(LAYOUT_KEY.into(), Value::String(layout_name.to_string()));
                    row.extend(read_with_prefix(source, &layout.sub_fields, &row_prefix));
                    rows.push(Value::Object(row));
                }
                if !rows.is_empty() {
                    results.insert(name.to_string(), Value::Array(rows));
                }
            }
        }
    }

    results
}

/// Row counts are stored as numbers, or as numeric strings by older writers.
fn row_count(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Flat meta entries for a repeater holding `rows`, the inverse of reading it.
///
/// Null row values are skipped.
pub fn flatten_rows(name: &str, rows: &[Map<String, Value>]) -> Vec<(String, Value)> {
    let mut entries = vec![(name.to_string(), Value::from(rows.len()))];
    for (i, row) in rows.iter().enumerate() {
        for (field, value) in row {
            if value.is_null() {
                continue;
            }
            entries.push((format!("{name}_{i}_{field}"), value.clone()));
        }
    }
    entries
}
