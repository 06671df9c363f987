use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};
use axum_helpers::{
    AppError, AuditEvent, AuditOutcome, AuthClaims, ValidatedJson,
    audit::extract_ip_from_headers,
    errors::responses::{
        BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse, ValidationErrorResponse,
    },
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::apply::{CommandRunner, OpsApplyMode};
use crate::error::{SecurityError, SecurityResult};
use crate::models::{OpsApplyRequest, OpsApplyResponse, PrepareKeyRequest, PrepareKeyResponse};
use crate::ops::{Operation, Stage};
use crate::reload::KeyReloader;
use crate::service::SecurityService;

#[derive(OpenApi)]
#[openapi(
    paths(prepare_qdrant_key, ops_apply, get_op),
    components(
        schemas(
            PrepareKeyRequest, PrepareKeyResponse, OpsApplyRequest, OpsApplyResponse,
            Operation, Stage, OpsApplyMode
        ),
        responses(
            BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse,
            NotFoundResponse, UnauthorizedResponse, ValidationErrorResponse
        )
    ),
    tags((name = "security", description = "Qdrant key rotation and operations"))
)]
pub struct SecurityApiDoc;

fn outcome_of<T>(result: &SecurityResult<T>) -> AuditOutcome {
    match result {
        Ok(_) => AuditOutcome::Success,
        Err(SecurityError::Auth(_)) | Err(SecurityError::OpsApplyDisabled) => AuditOutcome::Denied,
        Err(_) => AuditOutcome::Failure,
    }
}

/// Write a new Qdrant API key to the key file
///
/// Re-verifies the admin password. The store keeps using the old key until
/// it is restarted (see `ops_apply`).
#[utoipa::path(
    post,
    path = "/qdrant_key/prepare",
    tag = "security",
    request_body = PrepareKeyRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Key written", body = PrepareKeyResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse),
    )
)]
pub async fn prepare_qdrant_key<C: CommandRunner, K: KeyReloader>(
    State(service): State<Arc<SecurityService<C, K>>>,
    AuthClaims(claims): AuthClaims,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<PrepareKeyRequest>,
) -> Result<Json<PrepareKeyResponse>, AppError> {
    let result = service.prepare_key(&request).await;

    AuditEvent::new(Some(claims.sub), "qdrant_key.prepare", None, outcome_of(&result))
        .with_ip(extract_ip_from_headers(&headers))
        .with_details(json!({
            "op_id": result.as_ref().ok().map(|r| r.op_id.clone()),
        }))
        .log();

    Ok(Json(result?))
}

/// Restart the vector store with the prepared key
#[utoipa::path(
    post,
    path = "/ops_apply",
    tag = "security",
    request_body = OpsApplyRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Command planned or executed", body = OpsApplyResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse),
    )
)]
pub async fn ops_apply<C: CommandRunner, K: KeyReloader>(
    State(service): State<Arc<SecurityService<C, K>>>,
    AuthClaims(claims): AuthClaims,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<OpsApplyRequest>,
) -> Result<Json<OpsApplyResponse>, AppError> {
    let result = service.ops_apply(&request).await;

    AuditEvent::new(Some(claims.sub), "ops.apply", None, outcome_of(&result))
        .with_ip(extract_ip_from_headers(&headers))
        .with_details(json!({
            "dry_run": request.dry_run,
            "rc": result.as_ref().ok().and_then(|r| r.rc),
        }))
        .log();

    Ok(Json(result?))
}

/// Get a tracked operation
#[utoipa::path(
    get,
    path = "/ops/{op_id}",
    tag = "security",
    params(("op_id" = String, Path, description = "Operation id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Operation record", body = Operation),
        (status = 404, response = NotFoundResponse),
    )
)]
pub async fn get_op<C: CommandRunner, K: KeyReloader>(
    State(service): State<Arc<SecurityService<C, K>>>,
    Path(op_id): Path<String>,
) -> SecurityResult<Json<Operation>> {
    Ok(Json(service.get_op(&op_id).await?))
}

pub fn security_router<C, K>(service: Arc<SecurityService<C, K>>) -> Router
where
    C: CommandRunner + 'static,
    K: KeyReloader + 'static,
{
    Router::new()
        .route("/qdrant_key/prepare", post(prepare_qdrant_key::<C, K>))
        .route("/ops_apply", post(ops_apply::<C, K>))
        .route("/ops/{op_id}", get(get_op::<C, K>))
        .with_state(service)
}
