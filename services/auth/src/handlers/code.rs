use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::domain::types::CodePurpose;
use crate::error::AuthServiceError;
use crate::handlers::session_response;
use crate::state::AppState;
use crate::usecase::verification::{
    CheckCodeUseCase, LoginPurpose, RequestCodeInput, RequestCodeUseCase, VerifyCodeInput,
    VerifyCodeUseCase,
};

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PurposeParam {
    Email,
    Sms,
    Mfa,
}

impl From<PurposeParam> for CodePurpose {
    fn from(value: PurposeParam) -> Self {
        match value {
            PurposeParam::Email => CodePurpose::Email,
            PurposeParam::Sms => CodePurpose::Sms,
            PurposeParam::Mfa => CodePurpose::Mfa,
        }
    }
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ChannelParam {
    Email,
    Sms,
}

impl From<ChannelParam> for LoginPurpose {
    fn from(value: ChannelParam) -> Self {
        match value {
            ChannelParam::Email => LoginPurpose::Email,
            ChannelParam::Sms => LoginPurpose::Sms,
        }
    }
}

// ── POST /auth/code ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RequestCodeRequest {
    pub identifier: String,
    pub purpose: PurposeParam,
}

pub async fn request_code(
    State(state): State<AppState>,
    Json(body): Json<RequestCodeRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = RequestCodeUseCase {
        codes: state.code_repo(),
        notifier: state.notifier.clone(),
    };
    usecase
        .execute(RequestCodeInput {
            identifier: body.identifier,
            purpose: body.purpose.into(),
        })
        .await?;
    Ok(StatusCode::CREATED)
}

// ── POST /auth/code/verify ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub identifier: String,
    pub channel: ChannelParam,
    pub code: String,
}

pub async fn verify_code(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = VerifyCodeUseCase {
        codes: state.code_repo(),
        users: state.user_repo(),
        methods: state.method_repo(),
        sessions: state.session_repo(),
        secrets: state.secrets.clone(),
    };
    let pair = usecase
        .execute(VerifyCodeInput {
            identifier: body.identifier,
            purpose: body.channel.into(),
            code: body.code,
        })
        .await?;
    Ok(session_response(jar, state.cookie_domain.clone(), pair))
}

// ── POST /auth/code/check ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CheckCodeRequest {
    pub identifier: String,
    pub code: String,
}

/// Consume an mfa code without minting a session.
pub async fn check_code(
    State(state): State<AppState>,
    Json(body): Json<CheckCodeRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = CheckCodeUseCase {
        codes: state.code_repo(),
    };
    usecase.execute(&body.identifier, &body.code).await?;
    Ok(StatusCode::NO_CONTENT)
}
