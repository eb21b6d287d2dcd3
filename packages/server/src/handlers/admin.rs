use axum::Json;
use axum::extract::State;
use tracing::{info, instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::models::protection::{ProtectionStatusResponse, ReconcileResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/protection",
    tag = "Admin",
    operation_id = "getProtectionStatus",
    summary = "Show the protected directory status",
    description = "Returns the protected directory location, the rule text it should hold, \
        and when its files were last verified.",
    responses(
        (status = 200, description = "Protection status", body = ProtectionStatusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn protection_status(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<ProtectionStatusResponse>, AppError> {
    let directory = state.reconciler.directory();

    Ok(Json(ProtectionStatusResponse {
        directory_name: directory.name().to_string(),
        directory_path: directory.path().display().to_string(),
        directory_url: directory.url().to_string(),
        expected_rules: state.reconciler.expected_rules(),
        last_checked: state.reconciler.last_checked().await,
    }))
}

#[utoipa::path(
    post,
    path = "/protection/reconcile",
    tag = "Admin",
    operation_id = "reconcileProtection",
    summary = "Re-check the protected directory now",
    description = "Runs a forced pass regardless of when the last check happened: creates the \
        directory, rewrites drifted rules, and restores a missing sentinel file. \
        A `failed` status means at least one write did not land; the next pass retries.",
    responses(
        (status = 200, description = "Pass finished", body = ReconcileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn reconcile_protection(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<ReconcileResponse>, AppError> {
    let outcome = state.reconciler.reconcile(true).await;
    if outcome.is_failed() {
        warn!("Manual protection check failed");
    } else {
        info!("Manual protection check verified");
    }

    Ok(Json(ReconcileResponse::from(outcome)))
}
