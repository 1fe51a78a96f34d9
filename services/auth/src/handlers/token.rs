use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use lattice_auth_types::cookie::{
    LATTICE_ACCESS_TOKEN, LATTICE_REFRESH_TOKEN, clear_cookies, set_access_token_cookie,
};
use lattice_auth_types::token::validate_access_token;

use crate::error::AuthServiceError;
use crate::handlers::token_expires_header;
use crate::state::AppState;
use crate::usecase::session::{RefreshTokenUseCase, RevokeSessionUseCase, map_auth_error};

// ── GET /auth/token ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CheckTokenResponse {
    pub user_id: uuid::Uuid,
    pub email: Option<String>,
    pub access_token_exp: u64,
}

pub async fn check_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthServiceError> {
    let token_value = jar
        .get(LATTICE_ACCESS_TOKEN)
        .map(|c| c.value().to_owned())
        .ok_or(AuthServiceError::NotFound)?;

    let info = validate_access_token(&token_value, &state.secrets.access).map_err(map_auth_error)?;

    let body = CheckTokenResponse {
        user_id: info.user_id,
        email: info.email,
        access_token_exp: info.exp,
    };

    let mut headers = HeaderMap::new();
    let (name, value) = token_expires_header(body.access_token_exp);
    headers.insert(name, value);

    Ok((StatusCode::OK, headers, Json(body)))
}

// ── PATCH /auth/token ────────────────────────────────────────────────────────

/// Refresh issues a new access token only; the refresh token is not
/// rotated, so only the access cookie is replaced.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthServiceError> {
    let refresh_value = jar
        .get(LATTICE_REFRESH_TOKEN)
        .map(|c| c.value().to_owned())
        .ok_or(AuthServiceError::NotFound)?;

    let usecase = RefreshTokenUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
        secrets: state.secrets.clone(),
    };
    let out = usecase.execute(&refresh_value).await?;

    let jar = set_access_token_cookie(jar, out.access_token, state.cookie_domain.clone());

    let mut headers = HeaderMap::new();
    let (name, value) = token_expires_header(out.access_token_exp);
    headers.insert(name, value);

    Ok((StatusCode::CREATED, jar, headers))
}

// ── DELETE /auth/token ───────────────────────────────────────────────────────

pub async fn revoke_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = RevokeSessionUseCase {
        sessions: state.session_repo(),
    };

    // Prefer the access token; fall back to the refresh cookie, which is
    // path-scoped to this endpoint and outlives the access token.
    if let Some(access_value) = jar.get(LATTICE_ACCESS_TOKEN).map(|c| c.value().to_owned()) {
        let info =
            validate_access_token(&access_value, &state.secrets.access).map_err(map_auth_error)?;
        usecase.execute(info.session_id).await?;
    } else if let Some(refresh_value) =
        jar.get(LATTICE_REFRESH_TOKEN).map(|c| c.value().to_owned())
    {
        usecase.execute_by_refresh_token(&refresh_value).await?;
    } else {
        return Err(AuthServiceError::NotFound);
    }

    let jar = clear_cookies(jar, state.cookie_domain.clone());
    Ok((StatusCode::NO_CONTENT, jar))
}
