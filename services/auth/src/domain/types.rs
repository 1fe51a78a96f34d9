use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity anchor, created on first successful verification through any
/// method and never hard-deleted by this service.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Proof-of-identity channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Email,
    Sms,
    Wallet,
    Oauth,
}

impl MethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Wallet => "wallet",
            Self::Oauth => "oauth",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            "wallet" => Some(Self::Wallet),
            "oauth" => Some(Self::Oauth),
            _ => None,
        }
    }
}

/// Binds a user to one verified channel. The identifier is immutable once
/// created; at most one method per user is primary.
#[derive(Debug, Clone)]
pub struct AuthMethod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: MethodKind,
    pub provider: Option<String>,
    pub identifier: String,
    pub verified: bool,
    pub is_primary: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One row per issued token pair; id equals the JWT `sessionId` claim.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// What a one-time code proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    Email,
    Sms,
    Mfa,
}

impl CodePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Mfa => "mfa",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            "mfa" => Some(Self::Mfa),
            _ => None,
        }
    }
}

/// One-time numeric code delivered out-of-band.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub id: Uuid,
    pub identifier: String,
    pub purpose: CodePurpose,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub max_attempts: i32,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// One-time EIP-4361 challenge; address is stored lower-cased.
#[derive(Debug, Clone)]
pub struct SiweChallenge {
    pub id: Uuid,
    pub address: String,
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl SiweChallenge {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Long-lived API credential. The token string leaves the service only at
/// creation time.
#[derive(Debug, Clone)]
pub struct PersonalAccessToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Profile produced by the delegated OAuth exchange collaborator.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub provider: String,
    pub subject: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// OTP length in digits.
pub const OTP_LEN: usize = 6;

/// OTP time-to-live in seconds.
pub const OTP_TTL_SECS: i64 = 600;

/// Wrong guesses allowed per code.
pub const OTP_MAX_ATTEMPTS: i32 = 3;

/// SIWE challenge time-to-live in seconds.
pub const CHALLENGE_TTL_SECS: i64 = 900;

/// Personal-access-token creations allowed per user per window.
pub const PAT_CREATES_PER_WINDOW: u32 = 50;

/// Sliding window for token creation, in seconds (24 hours).
pub const PAT_CREATE_WINDOW_SECS: i64 = 86400;

/// Active personal access tokens allowed per user.
pub const MAX_ACTIVE_PATS: u64 = 500;

/// Bound on the collision-retry loop during token generation.
pub const PAT_GENERATION_RETRIES: u32 = 5;

/// Random characters in a personal-access-token body.
pub const PAT_BODY_LEN: usize = 32;
