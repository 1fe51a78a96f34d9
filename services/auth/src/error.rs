use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};

/// Auth service domain error variants.
///
/// One-time resources deliberately blur already-consumed and never-existed
/// into `NotFound`; everything else is reported distinctly so clients can
/// tell re-issuance (`*Expired`) from retry (`SignatureMismatch`,
/// `InvalidCode`) from quota conditions.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("invalid token name")]
    InvalidTokenName,
    #[error("invalid address")]
    InvalidAddress,
    #[error("malformed message")]
    MalformedMessage,
    #[error("malformed token")]
    MalformedToken,
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("invalid code")]
    InvalidCode { remaining: u32 },
    #[error("max attempts exceeded")]
    MaxAttemptsExceeded,
    #[error("wrong token type")]
    WrongTokenType,
    #[error("invalid token signature")]
    InvalidTokenSignature,
    #[error("token expired")]
    TokenExpired,
    #[error("session revoked")]
    SessionRevoked,
    #[error("session expired")]
    SessionExpired,
    #[error("code expired")]
    CodeExpired,
    #[error("challenge expired")]
    ChallengeExpired,
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("rate limit exceeded")]
    RateLimitExceeded { resets_at: DateTime<Utc> },
    #[error("max tokens exceeded")]
    MaxTokensExceeded,
    #[error("token generation failed")]
    TokenGenerationFailed,
    #[error("delivery failed")]
    DeliveryFailed,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTokenName => "INVALID_TOKEN_NAME",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::MalformedMessage => "MALFORMED_MESSAGE",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::InvalidCode { .. } => "INVALID_CODE",
            Self::MaxAttemptsExceeded => "MAX_ATTEMPTS_EXCEEDED",
            Self::WrongTokenType => "WRONG_TOKEN_TYPE",
            Self::InvalidTokenSignature => "INVALID_TOKEN_SIGNATURE",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::SessionRevoked => "SESSION_REVOKED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::ChallengeExpired => "CHALLENGE_EXPIRED",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::MaxTokensExceeded => "MAX_TOKENS_EXCEEDED",
            Self::TokenGenerationFailed => "TOKEN_GENERATION_FAILED",
            Self::DeliveryFailed => "DELIVERY_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidTokenName
            | Self::InvalidAddress
            | Self::MalformedMessage
            | Self::MalformedToken => StatusCode::BAD_REQUEST,
            Self::SignatureMismatch
            | Self::InvalidCode { .. }
            | Self::MaxAttemptsExceeded
            | Self::WrongTokenType
            | Self::InvalidTokenSignature
            | Self::TokenExpired
            | Self::SessionRevoked
            | Self::SessionExpired => StatusCode::UNAUTHORIZED,
            Self::CodeExpired | Self::ChallengeExpired => StatusCode::GONE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimitExceeded { .. } | Self::MaxTokensExceeded => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::TokenGenerationFailed | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DeliveryFailed => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only — tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        match &self {
            // Remaining attempts ride only on wrong-code responses; the
            // max-exceeded response stays bare on purpose.
            Self::InvalidCode { remaining } => {
                body["remaining_attempts"] = serde_json::json!(remaining);
            }
            Self::RateLimitExceeded { resets_at } => {
                body["resets_at"] = serde_json::json!(resets_at.to_rfc3339());
            }
            _ => {}
        }
        (status, axum::Json(body)).into_response()
    }
}
