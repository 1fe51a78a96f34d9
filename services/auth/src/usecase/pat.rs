//! Personal access tokens: creation under dual limits, validation with
//! lazy expiry, ownership-checked listing and deletion.

use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::RngExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::repository::PersonalAccessTokenRepository;
use crate::domain::types::{
    MAX_ACTIVE_PATS, PAT_BODY_LEN, PAT_CREATE_WINDOW_SECS, PAT_CREATES_PER_WINDOW,
    PAT_GENERATION_RETRIES, PersonalAccessToken,
};
use crate::error::AuthServiceError;
use crate::ratelimit::{RateLimitStore, RateLimiter};

const BASE62: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

// 248 = 4 × 62: bytes at or above it would skew the low symbols.
const BASE62_REJECT_AT: u8 = 248;

/// Substrings rejected regardless of the character whitelist above them.
/// The check is independent of the whitelist by design of the validation
/// sequence, not derived from it.
const DANGEROUS_SUBSTRINGS: &[&str] = &[
    "<script",
    "<iframe",
    "javascript:",
    "data:text/html",
    "onerror=",
    "onload=",
    "onclick=",
    "onmouseover=",
];

/// Validate a token name before any side effect: trim, bound the length to
/// 1–100, whitelist `[A-Za-z0-9 _.-]`, then reject dangerous substrings.
pub fn validate_token_name(name: &str) -> Result<&str, AuthServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 100 {
        return Err(AuthServiceError::InvalidTokenName);
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.' | '-'))
    {
        return Err(AuthServiceError::InvalidTokenName);
    }
    let lowered = trimmed.to_lowercase();
    if DANGEROUS_SUBSTRINGS.iter().any(|s| lowered.contains(s)) {
        return Err(AuthServiceError::InvalidTokenName);
    }
    Ok(trimmed)
}

/// Generate `{prefix}_{environment}_{base62 × 32}` with an unbiased body
/// (~190 bits of entropy).
pub fn generate_token(prefix: &str, environment: &str) -> String {
    let mut rng = rand::rng();
    let mut body = String::with_capacity(PAT_BODY_LEN);
    while body.len() < PAT_BODY_LEN {
        let byte: u8 = rng.random();
        if byte >= BASE62_REJECT_AT {
            continue;
        }
        body.push(BASE62[(byte % 62) as usize] as char);
    }
    format!("{prefix}_{environment}_{body}")
}

fn rate_limit_key(user_id: Uuid) -> String {
    format!("api_key_creation:{user_id}")
}

/// Round up to the next hour boundary; exact boundaries stay put.
fn ceil_to_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    let secs_into_hour = i64::from(dt.minute()) * 60 + i64::from(dt.second());
    let nanos = i64::from(dt.nanosecond());
    if secs_into_hour == 0 && nanos == 0 {
        return dt;
    }
    dt - Duration::seconds(secs_into_hour) - Duration::nanoseconds(nanos) + Duration::hours(1)
}

// ── CreatePat ────────────────────────────────────────────────────────────────

pub struct CreatePatInput {
    pub user_id: Uuid,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The only value that ever carries the token string out of the service.
#[derive(Debug)]
pub struct PatCreated {
    pub id: Uuid,
    pub name: String,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub struct CreatePatUseCase<P, L>
where
    P: PersonalAccessTokenRepository,
    L: RateLimitStore,
{
    pub tokens: P,
    pub limiter: Arc<RateLimiter<L>>,
    pub token_prefix: String,
    pub token_environment: String,
}

impl<P, L> CreatePatUseCase<P, L>
where
    P: PersonalAccessTokenRepository,
    L: RateLimitStore,
{
    pub async fn execute(&self, input: CreatePatInput) -> Result<PatCreated, AuthServiceError> {
        let name = validate_token_name(&input.name)?.to_owned();

        for _ in 0..PAT_GENERATION_RETRIES {
            let now = Utc::now();

            let decision = self
                .limiter
                .check_limit(
                    &rate_limit_key(input.user_id),
                    PAT_CREATES_PER_WINDOW,
                    PAT_CREATE_WINDOW_SECS,
                )
                .await;
            if !decision.allowed {
                // Reset time is deliberately coarse: rounded up to the hour.
                let resets_at = ceil_to_hour(decision.resets_at.unwrap_or(now));
                return Err(AuthServiceError::RateLimitExceeded { resets_at });
            }

            if self.tokens.count_active(input.user_id, now).await? >= MAX_ACTIVE_PATS {
                return Err(AuthServiceError::MaxTokensExceeded);
            }

            let token = generate_token(&self.token_prefix, &self.token_environment);
            if self.tokens.exists(&token).await? {
                // Entropy-improbable collision; retry the whole sequence.
                continue;
            }

            let record = PersonalAccessToken {
                id: Uuid::new_v4(),
                user_id: input.user_id,
                name: name.clone(),
                token: token.clone(),
                expires_at: input.expires_at,
                last_used_at: None,
                created_at: now,
            };
            self.tokens.create(&record).await?;

            return Ok(PatCreated {
                id: record.id,
                name: record.name,
                token,
                expires_at: record.expires_at,
                created_at: record.created_at,
            });
        }

        Err(AuthServiceError::TokenGenerationFailed)
    }
}

// ── ValidatePat ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PatIdentity {
    pub token_id: Uuid,
    pub user_id: Uuid,
}

pub struct ValidatePatUseCase<P: PersonalAccessTokenRepository> {
    pub tokens: P,
    /// Queue consumed by the last-used worker; validation never waits on it.
    pub last_used: UnboundedSender<Uuid>,
}

impl<P: PersonalAccessTokenRepository> ValidatePatUseCase<P> {
    pub async fn execute(&self, token: &str) -> Result<PatIdentity, AuthServiceError> {
        let record = self
            .tokens
            .find_by_token(token)
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        if let Some(expires_at) = record.expires_at {
            // Lazy expiry: the row stays until the sweeper removes it.
            if expires_at <= Utc::now() {
                return Err(AuthServiceError::TokenExpired);
            }
        }

        if self.last_used.send(record.id).is_err() {
            tracing::warn!(token_id = %record.id, "last-used queue closed; skipping update");
        }

        Ok(PatIdentity {
            token_id: record.id,
            user_id: record.user_id,
        })
    }
}

pub fn last_used_channel() -> (UnboundedSender<Uuid>, UnboundedReceiver<Uuid>) {
    mpsc::unbounded_channel()
}

/// Drain the last-used queue, stamping rows as they arrive. Update
/// failures are logged, never propagated. The task ends when every sender
/// is dropped, which is how tests flush it deterministically.
pub fn spawn_last_used_worker<P>(tokens: P, mut rx: UnboundedReceiver<Uuid>) -> JoinHandle<()>
where
    P: PersonalAccessTokenRepository + 'static,
{
    tokio::spawn(async move {
        while let Some(id) = rx.recv().await {
            if let Err(e) = tokens.touch_last_used(id, Utc::now()).await {
                tracing::warn!(token_id = %id, error = %e, "failed to stamp last-used");
            }
        }
    })
}

// ── ListPats / DeletePat ─────────────────────────────────────────────────────

/// Listing view; structurally omits the token string.
#[derive(Debug, Clone)]
pub struct PatSummary {
    pub id: Uuid,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub struct ListPatsUseCase<P: PersonalAccessTokenRepository> {
    pub tokens: P,
}

impl<P: PersonalAccessTokenRepository> ListPatsUseCase<P> {
    pub async fn execute(&self, user_id: Uuid) -> Result<Vec<PatSummary>, AuthServiceError> {
        let records = self.tokens.list_by_user(user_id).await?;
        Ok(records
            .into_iter()
            .map(|r| PatSummary {
                id: r.id,
                name: r.name,
                expires_at: r.expires_at,
                last_used_at: r.last_used_at,
                created_at: r.created_at,
            })
            .collect())
    }
}

pub struct DeletePatUseCase<P: PersonalAccessTokenRepository> {
    pub tokens: P,
}

impl<P: PersonalAccessTokenRepository> DeletePatUseCase<P> {
    /// Ownership is checked before the mutation; a mismatch is an
    /// authorization failure distinct from not-found.
    pub async fn execute(&self, caller_id: Uuid, token_id: Uuid) -> Result<(), AuthServiceError> {
        let record = self
            .tokens
            .find_by_id(token_id)
            .await?
            .ok_or(AuthServiceError::NotFound)?;
        if record.user_id != caller_id {
            return Err(AuthServiceError::Forbidden);
        }
        if !self.tokens.delete(token_id).await? {
            return Err(AuthServiceError::NotFound);
        }
        Ok(())
    }
}

/// Periodically remove rows past their expiry.
pub fn spawn_expiry_sweeper<P>(tokens: P) -> JoinHandle<()>
where
    P: PersonalAccessTokenRepository + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match tokens.delete_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(count = n, "removed expired personal access tokens"),
                Err(e) => tracing::warn!(error = %e, "expired-token sweep failed"),
            }
        }
    })
}
