//! JWT pair issuance and the session lifecycle.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use lattice_auth_types::cookie::{ACCESS_TOKEN_EXP, REFRESH_TOKEN_EXP};
use lattice_auth_types::token::{
    AUDIENCE, AuthError, ISSUER, JwtClaims, TokenType, validate_refresh_token,
};

use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::types::{Session, User};
use crate::error::AuthServiceError;

/// Distinct signing secrets per token type. A token of one type can never
/// validate as the other even if an attacker swaps the secrets.
#[derive(Clone)]
pub struct JwtSecrets {
    pub access: String,
    pub refresh: String,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

pub(crate) fn map_auth_error(e: AuthError) -> AuthServiceError {
    match e {
        AuthError::WrongTokenType => AuthServiceError::WrongTokenType,
        AuthError::InvalidSignature => AuthServiceError::InvalidTokenSignature,
        AuthError::Expired => AuthServiceError::TokenExpired,
        AuthError::Malformed => AuthServiceError::MalformedToken,
    }
}

fn sign(claims: &JwtClaims, secret: &str) -> Result<String, AuthServiceError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))
}

pub fn issue_access_token(
    user_id: Uuid,
    email: Option<&str>,
    session_id: Uuid,
    secret: &str,
) -> Result<(String, u64), AuthServiceError> {
    let exp = now_secs() + ACCESS_TOKEN_EXP;
    let claims = JwtClaims {
        user_id: user_id.to_string(),
        email: email.map(str::to_owned),
        session_id: session_id.to_string(),
        token_type: TokenType::Access,
        iss: ISSUER.to_owned(),
        aud: AUDIENCE.to_owned(),
        exp,
    };
    Ok((sign(&claims, secret)?, exp))
}

/// Refresh tokens carry no email claim.
pub fn issue_refresh_token(
    user_id: Uuid,
    session_id: Uuid,
    secret: &str,
) -> Result<String, AuthServiceError> {
    let claims = JwtClaims {
        user_id: user_id.to_string(),
        email: None,
        session_id: session_id.to_string(),
        token_type: TokenType::Refresh,
        iss: ISSUER.to_owned(),
        aud: AUDIENCE.to_owned(),
        exp: now_secs() + REFRESH_TOKEN_EXP,
    };
    sign(&claims, secret)
}

#[derive(Debug)]
pub struct TokenPairOutput {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

/// Mint a fresh session: an access/refresh pair sharing one session id,
/// plus the session row backing independent revocation.
pub async fn mint_session<S: SessionRepository>(
    sessions: &S,
    user: &User,
    secrets: &JwtSecrets,
) -> Result<TokenPairOutput, AuthServiceError> {
    let session_id = Uuid::new_v4();
    let (access_token, access_token_exp) =
        issue_access_token(user.id, user.email.as_deref(), session_id, &secrets.access)?;
    let refresh_token = issue_refresh_token(user.id, session_id, &secrets.refresh)?;

    let now = Utc::now();
    let session = Session {
        id: session_id,
        user_id: user.id,
        refresh_token: refresh_token.clone(),
        expires_at: now + Duration::seconds(REFRESH_TOKEN_EXP as i64),
        revoked: false,
        revoked_at: None,
        last_activity_at: now,
        created_at: now,
    };
    sessions.create(&session).await?;

    Ok(TokenPairOutput {
        user_id: user.id,
        session_id,
        access_token,
        access_token_exp,
        refresh_token,
    })
}

// ── RefreshToken ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RefreshTokenOutput {
    pub user_id: Uuid,
    pub access_token: String,
    pub access_token_exp: u64,
}

pub struct RefreshTokenUseCase<U: UserRepository, S: SessionRepository> {
    pub users: U,
    pub sessions: S,
    pub secrets: JwtSecrets,
}

impl<U: UserRepository, S: SessionRepository> RefreshTokenUseCase<U, S> {
    /// Validate the refresh JWT, check the session row, and issue a new
    /// access token only — the refresh token is not rotated.
    pub async fn execute(
        &self,
        refresh_token_value: &str,
    ) -> Result<RefreshTokenOutput, AuthServiceError> {
        let info = validate_refresh_token(refresh_token_value, &self.secrets.refresh)
            .map_err(map_auth_error)?;

        let session = self
            .sessions
            .find_by_id(info.session_id)
            .await?
            .ok_or(AuthServiceError::NotFound)?;
        if session.revoked {
            return Err(AuthServiceError::SessionRevoked);
        }
        let now = Utc::now();
        if session.expires_at <= now {
            return Err(AuthServiceError::SessionExpired);
        }
        // The stored string must match the presented token; a mismatch is
        // reported as not-found so nothing is disclosed about the session
        // that does exist under this id.
        if session.refresh_token != refresh_token_value {
            return Err(AuthServiceError::NotFound);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        let (access_token, access_token_exp) =
            issue_access_token(user.id, user.email.as_deref(), session.id, &self.secrets.access)?;
        self.sessions.touch_activity(session.id, now).await?;

        Ok(RefreshTokenOutput {
            user_id: user.id,
            access_token,
            access_token_exp,
        })
    }
}

// ── RevokeSession ────────────────────────────────────────────────────────────

pub struct RevokeSessionUseCase<S: SessionRepository> {
    pub sessions: S,
}

impl<S: SessionRepository> RevokeSessionUseCase<S> {
    /// Terminal revocation; a revoked session is never reactivated.
    pub async fn execute(&self, session_id: Uuid) -> Result<(), AuthServiceError> {
        if !self.sessions.revoke(session_id, Utc::now()).await? {
            return Err(AuthServiceError::NotFound);
        }
        Ok(())
    }

    /// Logout fallback for clients whose access token is already gone: the
    /// refresh-token string still identifies the session row.
    pub async fn execute_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<(), AuthServiceError> {
        let session = self
            .sessions
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthServiceError::NotFound)?;
        self.execute(session.id).await
    }
}
