use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::handlers::session_response;
use crate::state::AppState;
use crate::usecase::oauth::{OAuthLoginInput, OAuthLoginUseCase};

// ── POST /auth/oauth ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct OAuthLoginRequest {
    pub provider: String,
    pub code: String,
    pub redirect_uri: String,
}

pub async fn oauth_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<OAuthLoginRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = OAuthLoginUseCase {
        provider_port: state.oauth.clone(),
        users: state.user_repo(),
        methods: state.method_repo(),
        sessions: state.session_repo(),
        secrets: state.secrets.clone(),
    };
    let pair = usecase
        .execute(OAuthLoginInput {
            provider: body.provider,
            code: body.code,
            redirect_uri: body.redirect_uri,
        })
        .await?;
    Ok(session_response(jar, state.cookie_domain.clone(), pair))
}
