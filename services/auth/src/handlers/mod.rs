pub mod code;
pub mod oauth;
pub mod pat;
pub mod siwe;
pub mod token;

use axum::Json;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use lattice_auth_types::cookie::{set_access_token_cookie, set_refresh_token_cookie};

use crate::usecase::session::TokenPairOutput;

const X_LATTICE_ACCESS_TOKEN_EXPIRES: &str = "x-lattice-access-token-expires";

pub(crate) fn token_expires_header(exp: u64) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(X_LATTICE_ACCESS_TOKEN_EXPIRES),
        HeaderValue::from_str(&exp.to_string()).unwrap(),
    )
}

#[derive(Serialize)]
pub(crate) struct SessionResponse {
    pub user_id: Uuid,
}

/// Common tail of every login flow: both token cookies, the expires
/// header, and a minimal body.
pub(crate) fn session_response(
    jar: CookieJar,
    domain: String,
    pair: TokenPairOutput,
) -> (StatusCode, CookieJar, HeaderMap, Json<SessionResponse>) {
    let jar = set_access_token_cookie(jar, pair.access_token, domain.clone());
    let jar = set_refresh_token_cookie(jar, pair.refresh_token, domain);

    let mut headers = HeaderMap::new();
    let (name, value) = token_expires_header(pair.access_token_exp);
    headers.insert(name, value);

    (
        StatusCode::CREATED,
        jar,
        headers,
        Json(SessionResponse {
            user_id: pair.user_id,
        }),
    )
}
