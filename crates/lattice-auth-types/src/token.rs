//! JWT access/refresh-token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
use serde::Serialize;
use uuid::Uuid;

/// Issuer claim pinned into every token this service mints.
pub const ISSUER: &str = "lattice-auth";

/// Audience claim pinned into every token this service mints.
pub const AUDIENCE: &str = "lattice-api";

/// Whether a token was minted as a short-lived access token or a
/// long-lived refresh token. Serialized into the `type` claim; access and
/// refresh tokens are additionally signed with distinct secrets, so even a
/// swapped secret cannot make one validate as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test), derive(Serialize))]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// User identity extracted from a validated token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub session_id: Uuid,
    pub exp: u64,
}

/// Errors returned by token validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `type` claim does not match the expected token type. Reported
    /// before any cryptographic check so callers can distinguish a
    /// refresh-token-as-access-token mistake from a forged token.
    #[error("wrong token type")]
    WrongTokenType,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// JWT claims payload shared by token creation (auth service) and
/// validation (gateway and downstream services).
///
/// Custom claims `userId`, `email` (access tokens only), `sessionId` and
/// `type` ride alongside the standard `iss`/`aud`/`exp`.
///
/// # Feature gate
///
/// [`Deserialize`] is always available — all consumers validate tokens.
/// [`Serialize`] requires the **`USE_ONLY_IN_AUTH_SERVICE`** cargo feature.
/// Only the auth service enables it because it is the sole token issuer.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test), derive(Serialize))]
pub struct JwtClaims {
    /// User ID (UUID string).
    #[serde(rename = "userId")]
    pub user_id: String,
    /// User email, present on access tokens when the user has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Session ID (UUID string) shared by the access/refresh pair.
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// Token type discriminator.
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iss: String,
    pub aud: String,
    /// Expiration timestamp (seconds since UNIX epoch).
    pub exp: u64,
}

// ── Core decode ──────────────────────────────────────────────────────────

/// Read the `type` claim without verifying the signature.
///
/// Nothing from this decode is trusted beyond classifying the token; the
/// full cryptographic validation always follows in [`validate_token`].
pub fn peek_token_type(token: &str) -> Result<TokenType, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<JwtClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| AuthError::Malformed)?;
    Ok(data.claims.token_type)
}

/// Validate a token of the expected type, returning its claims.
///
/// The `type` claim is checked first (see [`peek_token_type`]); only then
/// are signature, issuer, audience and expiry verified against `secret`.
/// Default leeway = 60s — tolerates clock skew between services.
pub fn validate_token(
    token: &str,
    secret: &str,
    expected: TokenType,
) -> Result<JwtClaims, AuthError> {
    if peek_token_type(token)? != expected {
        return Err(AuthError::WrongTokenType);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[ISSUER]);
    validation.set_audience(&[AUDIENCE]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(data.claims)
}

/// Validate an access token, returning parsed identity.
///
/// This is the primary public API for request authentication. The gateway
/// calls this on every request to extract user identity from the JWT.
pub fn validate_access_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    token_info(validate_token(token, secret, TokenType::Access)?)
}

/// Validate a refresh token, returning parsed identity. Used by the auth
/// service's refresh flow before the session row is consulted.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    token_info(validate_token(token, secret, TokenType::Refresh)?)
}

fn token_info(claims: JwtClaims) -> Result<TokenInfo, AuthError> {
    let user_id = claims
        .user_id
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    let session_id = claims
        .session_id
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    Ok(TokenInfo {
        user_id,
        email: claims.email,
        session_id,
        exp: claims.exp,
    })
}
