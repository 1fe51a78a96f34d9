#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{
    AuthMethod, MethodKind, PersonalAccessToken, Session, SiweChallenge, User, VerificationCode,
};
use crate::error::AuthServiceError;

/// Repository for user identity rows.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthServiceError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AuthServiceError>;
    async fn create(&self, user: &User) -> Result<(), AuthServiceError>;

    /// Stamp last_login and the channel verification flag in one update.
    async fn record_login(
        &self,
        id: Uuid,
        kind: MethodKind,
        now: DateTime<Utc>,
    ) -> Result<(), AuthServiceError>;
}

/// Repository for proof-of-identity channel bindings.
pub trait AuthMethodRepository: Send + Sync {
    /// Lookup by the globally-unique (identifier, kind) pair.
    async fn find(
        &self,
        identifier: &str,
        kind: MethodKind,
    ) -> Result<Option<AuthMethod>, AuthServiceError>;

    async fn create(&self, method: &AuthMethod) -> Result<(), AuthServiceError>;

    async fn touch_last_used(&self, id: Uuid, now: DateTime<Utc>)
    -> Result<(), AuthServiceError>;

    /// Unset the primary flag on every method the user owns.
    async fn clear_primary(&self, user_id: Uuid) -> Result<(), AuthServiceError>;

    /// Set the primary flag on one method.
    async fn set_primary(&self, id: Uuid) -> Result<(), AuthServiceError>;
}

/// Repository for session rows backing issued token pairs.
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), AuthServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, AuthServiceError>;

    /// Lookup by the globally-unique refresh-token string.
    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, AuthServiceError>;

    /// Mark a session revoked. Returns `false` if no live session matched.
    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, AuthServiceError>;

    async fn touch_activity(&self, id: Uuid, now: DateTime<Utc>)
    -> Result<(), AuthServiceError>;
}

/// Repository for one-time verification codes.
pub trait VerificationCodeRepository: Send + Sync {
    async fn create(&self, code: &VerificationCode) -> Result<(), AuthServiceError>;

    /// The current code for (identifier, purpose): the most recently
    /// created unverified row, regardless of expiry — the caller reports
    /// expiry distinctly from absence.
    async fn find_current(
        &self,
        identifier: &str,
        purpose: crate::domain::types::CodePurpose,
    ) -> Result<Option<VerificationCode>, AuthServiceError>;

    async fn increment_attempts(&self, id: Uuid) -> Result<(), AuthServiceError>;

    /// One-time consumption: set verified only if still unverified.
    /// Returns `false` when a concurrent verify already consumed the row.
    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError>;
}

/// Repository for one-time SIWE challenges.
pub trait ChallengeRepository: Send + Sync {
    async fn create(&self, challenge: &SiweChallenge) -> Result<(), AuthServiceError>;

    /// Lookup an unverified challenge by (lower-cased address, nonce).
    async fn find_pending(
        &self,
        address: &str,
        nonce: &str,
    ) -> Result<Option<SiweChallenge>, AuthServiceError>;

    /// One-time consumption: set verified only if still unverified.
    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError>;
}

/// Repository for long-lived personal access tokens.
pub trait PersonalAccessTokenRepository: Send + Sync {
    async fn create(&self, token: &PersonalAccessToken) -> Result<(), AuthServiceError>;
    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<PersonalAccessToken>, AuthServiceError>;
    async fn find_by_id(&self, id: Uuid)
    -> Result<Option<PersonalAccessToken>, AuthServiceError>;

    /// Whether any row already carries this exact token string.
    async fn exists(&self, token: &str) -> Result<bool, AuthServiceError>;

    /// Count unexpired tokens owned by the user.
    async fn count_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AuthServiceError>;

    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PersonalAccessToken>, AuthServiceError>;

    /// Delete a token. Returns `false` if not found.
    async fn delete(&self, id: Uuid) -> Result<bool, AuthServiceError>;

    fn touch_last_used(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), AuthServiceError>> + Send;

    /// Delete rows past their expiry. Returns how many were removed.
    fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, AuthServiceError>> + Send;
}

/// Port for the out-of-band notification collaborator (email/SMS).
pub trait Notifier: Send + Sync {
    /// Deliver a verification code. Failure must surface as
    /// [`AuthServiceError::DeliveryFailed`], distinct from validation
    /// failures.
    async fn send_verification_code(
        &self,
        destination: &str,
        code: &str,
    ) -> Result<(), AuthServiceError>;
}

/// Port for the delegated OAuth exchange collaborator — the thin HTTP
/// call to a third-party provider, kept outside the authentication core.
pub trait OAuthProviderPort: Send + Sync {
    async fn fetch_profile(
        &self,
        provider: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<crate::domain::types::OAuthProfile, AuthServiceError>;
}
