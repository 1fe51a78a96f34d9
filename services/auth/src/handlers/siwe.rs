use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthServiceError;
use crate::handlers::session_response;
use crate::state::AppState;
use crate::usecase::siwe::{
    CreateChallengeInput, CreateChallengeUseCase, VerifyChallengeInput, VerifyChallengeUseCase,
};

fn default_chain_id() -> u64 {
    1
}

// ── POST /auth/siwe/challenge ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateChallengeRequest {
    pub address: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default)]
    pub statement: Option<String>,
}

#[derive(Serialize)]
pub struct ChallengeResponse {
    pub message: String,
    pub nonce: String,
    #[serde(serialize_with = "lattice_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

pub async fn create_challenge(
    State(state): State<AppState>,
    Json(body): Json<CreateChallengeRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = CreateChallengeUseCase {
        challenges: state.challenge_repo(),
        domain: state.siwe_domain.clone(),
        uri: state.siwe_uri.clone(),
    };
    let out = usecase
        .execute(CreateChallengeInput {
            address: body.address,
            chain_id: body.chain_id,
            statement: body.statement,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ChallengeResponse {
            message: out.message,
            nonce: out.nonce,
            expires_at: out.expires_at,
        }),
    ))
}

// ── POST /auth/siwe/verify ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyChallengeRequest {
    pub address: String,
    pub message: String,
    pub signature: String,
}

pub async fn verify_challenge(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyChallengeRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = VerifyChallengeUseCase {
        challenges: state.challenge_repo(),
        users: state.user_repo(),
        methods: state.method_repo(),
        sessions: state.session_repo(),
        secrets: state.secrets.clone(),
    };
    let pair = usecase
        .execute(VerifyChallengeInput {
            address: body.address,
            message: body.message,
            signature: body.signature,
        })
        .await?;
    Ok(session_response(jar, state.cookie_domain.clone(), pair))
}
