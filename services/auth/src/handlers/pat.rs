use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use lattice_auth_types::identity::IdentityHeaders;
use lattice_core::serde::{opt_to_rfc3339_ms, to_rfc3339_ms};

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::pat::{
    CreatePatInput, CreatePatUseCase, DeletePatUseCase, ListPatsUseCase, ValidatePatUseCase,
};

// ── POST /auth/pats ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreatePatRequest {
    pub name: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// The token string appears in this response and nowhere else.
#[derive(Serialize)]
pub struct PatCreatedResponse {
    pub id: Uuid,
    pub name: String,
    pub token: String,
    #[serde(serialize_with = "opt_to_rfc3339_ms")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

pub async fn create_pat(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Json(body): Json<CreatePatRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = CreatePatUseCase {
        tokens: state.pat_repo(),
        limiter: Arc::clone(&state.rate_limiter),
        token_prefix: state.token_prefix.clone(),
        token_environment: state.token_environment.clone(),
    };
    let created = usecase
        .execute(CreatePatInput {
            user_id: identity.user_id,
            name: body.name,
            expires_at: body.expires_at,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PatCreatedResponse {
            id: created.id,
            name: created.name,
            token: created.token,
            expires_at: created.expires_at,
            created_at: created.created_at,
        }),
    ))
}

// ── GET /auth/pats ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PatSummaryResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(serialize_with = "opt_to_rfc3339_ms")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "opt_to_rfc3339_ms")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

pub async fn list_pats(
    State(state): State<AppState>,
    identity: IdentityHeaders,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ListPatsUseCase {
        tokens: state.pat_repo(),
    };
    let summaries = usecase.execute(identity.user_id).await?;
    let body: Vec<PatSummaryResponse> = summaries
        .into_iter()
        .map(|s| PatSummaryResponse {
            id: s.id,
            name: s.name,
            expires_at: s.expires_at,
            last_used_at: s.last_used_at,
            created_at: s.created_at,
        })
        .collect();
    Ok(Json(body))
}

// ── DELETE /auth/pats/{id} ───────────────────────────────────────────────────

pub async fn delete_pat(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Path(token_id): Path<Uuid>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = DeletePatUseCase {
        tokens: state.pat_repo(),
    };
    usecase.execute(identity.user_id, token_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /auth/pat/validate ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ValidatePatRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct PatIdentityResponse {
    pub user_id: Uuid,
    pub token_id: Uuid,
}

/// Internal endpoint the gateway calls to authenticate API-token requests.
pub async fn validate_pat(
    State(state): State<AppState>,
    Json(body): Json<ValidatePatRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ValidatePatUseCase {
        tokens: state.pat_repo(),
        last_used: state.pat_last_used.clone(),
    };
    let identity = usecase.execute(&body.token).await?;
    Ok(Json(PatIdentityResponse {
        user_id: identity.user_id,
        token_id: identity.token_id,
    }))
}
