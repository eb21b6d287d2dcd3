use axum::Json;
use axum::extract::{Path, State};
use common::fields::read_fields;
use common::protection::{ValidateValueEvent, Validity};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::{AppError, ErrorBody, FieldErrorBody};
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::meta::{PostId, file_list_schema, row_fields};
use crate::models::post_files::{FileEntry, PostFilesResponse, SaveFilesRequest, SaveFilesResponse};
use crate::state::AppState;

const FILE_REQUIRED: &str = "A file is required.";

#[utoipa::path(
    put,
    path = "/{post_id}/files",
    tag = "Post Files",
    operation_id = "savePostFiles",
    summary = "Replace a post's protected file list",
    description = "Validates every row, then replaces the stored list. Each row's file must \
        exist and live in the protected directory. If any row is invalid nothing is stored.",
    params(("post_id" = u64, Path, description = "Post ID")),
    request_body = SaveFilesRequest,
    responses(
        (status = 200, description = "File list stored", body = SaveFilesResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(rows = payload.rows.len()))]
pub async fn save_post_files(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    AppJson(payload): AppJson<SaveFilesRequest>,
) -> Result<Json<SaveFilesResponse>, AppError> {
    let fields = &state.config.fields;
    let mut errors = Vec::new();

    for (row, input) in payload.rows.iter().enumerate() {
        let valid = if fields.file_required && input.file.is_none() {
            Validity::Invalid(FILE_REQUIRED.into())
        } else {
            Validity::Valid
        };

        let checked = state
            .hooks
            .trigger(ValidateValueEvent {
                field_key: fields.file_field_key.clone(),
                value: input.file,
                valid,
            })
            .await?;

        if let Validity::Invalid(message) = checked.valid {
            errors.push(FieldErrorBody {
                row,
                field: row_fields::FILE.into(),
                message,
            });
        }
    }

    if !errors.is_empty() {
        debug!(post_id, invalid = errors.len(), "Rejected file list");
        return Err(AppError::InvalidFields(errors));
    }

    let rows: Vec<_> = payload.rows.into_iter().map(|r| r.into_meta()).collect();
    state.posts.replace_rows(post_id, &fields.group_name, &rows);
    info!(post_id, rows = rows.len(), "Saved file list");

    Ok(Json(SaveFilesResponse {
        post_id,
        rows: rows.len(),
    }))
}

#[utoipa::path(
    get,
    path = "/{post_id}/files",
    tag = "Post Files",
    operation_id = "listPostFiles",
    summary = "List a post's protected files",
    description = "Returns the post's file list with resolved URLs. Rows without a file, or whose \
        file no longer exists, are skipped. Rows without a title use the file's name.",
    params(("post_id" = u64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "File list", body = PostFilesResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_post_files(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
) -> Result<Json<PostFilesResponse>, AppError> {
    let fields = &state.config.fields;
    let Some(meta) = state.posts.post(post_id) else {
        return Ok(Json(PostFilesResponse {
            post_id,
            files: Vec::new(),
        }));
    };

    let values = read_fields(&meta, &file_list_schema(fields));
    let rows = match values.get(&fields.group_name) {
        Some(Value::Array(rows)) => rows.as_slice(),
        _ => &[],
    };

    let mut files = Vec::new();
    for row in rows {
        let Some(file_id) = row.get(row_fields::FILE).and_then(Value::as_u64) else {
            continue;
        };
        let Some(file) = state.media.get(file_id) else {
            debug!(post_id, file_id, "Skipping row with missing attachment");
            continue;
        };

        let text = |key: &str| {
            row.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let title = text(row_fields::TITLE).unwrap_or_else(|| basename(&file.url).to_string());
        let image_url = row
            .get(row_fields::IMAGE)
            .and_then(Value::as_u64)
            .and_then(|id| state.media.get(id))
            .map(|image| image.url);

        files.push(FileEntry {
            title,
            desc: text(row_fields::DESC),
            file_id,
            extension: extension(&file.url).map(str::to_string),
            file_url: file.url,
            image_url,
        });
    }

    Ok(Json(PostFilesResponse { post_id, files }))
}

fn basename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

fn extension(url: &str) -> Option<&str> {
    match basename(url).rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}
