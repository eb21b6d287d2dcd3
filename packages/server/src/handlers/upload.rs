use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::protection::{UploadDirEvent, UploadTarget};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::models::attachment::AttachmentResponse;
use crate::state::AppState;
use crate::utils::filename::{ReservedFile, reserve_filename, validate_flat_filename};

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024) // 64 MB
}

#[utoipa::path(
    post,
    path = "/{field_key}/uploads",
    tag = "Uploads",
    operation_id = "uploadFieldFile",
    summary = "Upload a file for a field",
    description = "Stores the `file` multipart field in the media library. The storage location \
        is resolved through the field's upload hooks: files for the managed protected-file field \
        land in the protected directory, every other field keeps the default upload root. \
        A numeric suffix is added when the name is already taken.",
    params(("field_key" = String, Path, description = "Field identifier")),
    request_body(content_type = "multipart/form-data", description = "File upload"),
    responses(
        (status = 201, description = "File stored", body = AttachmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
#[instrument(skip(state, _admin, multipart))]
pub async fn upload_file(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(field_key): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let file_name = validate_flat_filename(&file_name)
        .map_err(|e| AppError::Validation(e.message().into()))?;

    let fields = &state.config.fields;
    if field_key == fields.file_field_key && !fields.accepts_filename(file_name) {
        return Err(AppError::Validation(format!(
            "File type not allowed. Allowed extensions: {}",
            fields.allowed_extensions.join(", ")
        )));
    }

    let proposed = UploadTarget {
        base_dir: state.config.site.upload_dir.clone(),
        base_url: state.config.site.upload_base_url(),
    };
    let UploadDirEvent { target, .. } = state
        .hooks
        .trigger(UploadDirEvent {
            field_key: field_key.clone(),
            target: proposed,
        })
        .await?;

    let is_dir = tokio::fs::metadata(&target.base_dir)
        .await
        .is_ok_and(|m| m.is_dir());
    if !is_dir {
        tokio::fs::create_dir_all(&target.base_dir).await?;
        // A recreated protected directory must not sit ungated until the next scheduled check.
        if target.base_dir == state.reconciler.directory().path() {
            let outcome = state.reconciler.reconcile(true).await;
            if outcome.is_failed() {
                warn!(?outcome, "Recreated protected directory is not fully in place");
            }
        }
    }

    let ReservedFile {
        name: stored_name,
        path,
        mut file,
    } = reserve_filename(&target.base_dir, file_name).await?;
    let written = async {
        file.write_all(&bytes).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        drop(file);
        let _ = tokio::fs::remove_file(&path).await;
        return Err(e.into());
    }

    let url = format!("{}/{}", target.base_url.trim_end_matches('/'), stored_name);
    let attachment = state
        .media
        .insert(stored_name, path, url, bytes.len() as u64);

    info!(
        attachment_id = attachment.id,
        field_key = %field_key,
        url = %attachment.url,
        "Stored upload"
    );

    Ok((
        StatusCode::CREATED,
        Json(AttachmentResponse::from(attachment)),
    ))
}
