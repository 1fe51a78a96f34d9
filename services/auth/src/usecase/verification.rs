//! One-time verification codes: issuance and consumption.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::repository::{
    AuthMethodRepository, Notifier, SessionRepository, UserRepository, VerificationCodeRepository,
};
use crate::domain::types::{CodePurpose, OTP_LEN, OTP_MAX_ATTEMPTS, OTP_TTL_SECS, VerificationCode};
use crate::error::AuthServiceError;
use crate::usecase::identity::{LoginChannel, resolve_login};
use crate::usecase::otp::generate_otp;
use crate::usecase::session::{JwtSecrets, TokenPairOutput, mint_session};

// ── RequestCode ──────────────────────────────────────────────────────────────

pub struct RequestCodeInput {
    pub identifier: String,
    pub purpose: CodePurpose,
}

pub struct RequestCodeUseCase<V, N>
where
    V: VerificationCodeRepository,
    N: Notifier,
{
    pub codes: V,
    pub notifier: N,
}

impl<V, N> RequestCodeUseCase<V, N>
where
    V: VerificationCodeRepository,
    N: Notifier,
{
    /// Persist a fresh code and hand it to the notifier. An earlier pending
    /// code for the same (identifier, purpose) is left alone; only the most
    /// recent one is ever looked up.
    pub async fn execute(&self, input: RequestCodeInput) -> Result<(), AuthServiceError> {
        let code_value = generate_otp(OTP_LEN);
        let now = Utc::now();
        let code = VerificationCode {
            id: Uuid::new_v4(),
            identifier: input.identifier.clone(),
            purpose: input.purpose,
            code: code_value.clone(),
            expires_at: now + Duration::seconds(OTP_TTL_SECS),
            attempts: 0,
            max_attempts: OTP_MAX_ATTEMPTS,
            verified: false,
            created_at: now,
        };
        self.codes.create(&code).await?;

        self.notifier
            .send_verification_code(&input.identifier, &code_value)
            .await?;
        Ok(())
    }
}

// ── One-time consumption ─────────────────────────────────────────────────────

/// Lookup, expiry, attempt budget, comparison, atomic consume — shared by
/// the login and mfa paths.
pub(crate) async fn consume_current<V: VerificationCodeRepository>(
    codes: &V,
    identifier: &str,
    purpose: CodePurpose,
    candidate: &str,
) -> Result<VerificationCode, AuthServiceError> {
    let current = codes
        .find_current(identifier, purpose)
        .await?
        .ok_or(AuthServiceError::NotFound)?;

    if current.is_expired(Utc::now()) {
        return Err(AuthServiceError::CodeExpired);
    }
    // Budget check runs before the comparison: a correct code submitted
    // after exhaustion is still rejected.
    if current.attempts >= current.max_attempts {
        return Err(AuthServiceError::MaxAttemptsExceeded);
    }
    if current.code != candidate {
        codes.increment_attempts(current.id).await?;
        let remaining = (current.max_attempts - current.attempts - 1).max(0) as u32;
        return Err(AuthServiceError::InvalidCode { remaining });
    }
    if !codes.consume(current.id).await? {
        // Lost the race to a concurrent verify. Indistinguishable from a
        // code that never existed.
        return Err(AuthServiceError::NotFound);
    }
    Ok(current)
}

// ── VerifyCode (login) ───────────────────────────────────────────────────────

/// Channels a code login can arrive through; mfa codes go through
/// [`CheckCodeUseCase`] instead.
#[derive(Debug, Clone, Copy)]
pub enum LoginPurpose {
    Email,
    Sms,
}

impl LoginPurpose {
    pub fn code_purpose(self) -> CodePurpose {
        match self {
            Self::Email => CodePurpose::Email,
            Self::Sms => CodePurpose::Sms,
        }
    }

    fn channel(self, identifier: String) -> LoginChannel {
        match self {
            Self::Email => LoginChannel::Email(identifier),
            Self::Sms => LoginChannel::Phone(identifier),
        }
    }
}

pub struct VerifyCodeInput {
    pub identifier: String,
    pub purpose: LoginPurpose,
    pub code: String,
}

pub struct VerifyCodeUseCase<V, U, M, S>
where
    V: VerificationCodeRepository,
    U: UserRepository,
    M: AuthMethodRepository,
    S: SessionRepository,
{
    pub codes: V,
    pub users: U,
    pub methods: M,
    pub sessions: S,
    pub secrets: JwtSecrets,
}

impl<V, U, M, S> VerifyCodeUseCase<V, U, M, S>
where
    V: VerificationCodeRepository,
    U: UserRepository,
    M: AuthMethodRepository,
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        input: VerifyCodeInput,
    ) -> Result<TokenPairOutput, AuthServiceError> {
        consume_current(
            &self.codes,
            &input.identifier,
            input.purpose.code_purpose(),
            &input.code,
        )
        .await?;

        let channel = input.purpose.channel(input.identifier);
        let user = resolve_login(&self.users, &self.methods, &channel).await?;
        mint_session(&self.sessions, &user, &self.secrets).await
    }
}

// ── CheckCode (mfa) ──────────────────────────────────────────────────────────

/// Consume an mfa code without touching users or sessions.
pub struct CheckCodeUseCase<V: VerificationCodeRepository> {
    pub codes: V,
}

impl<V: VerificationCodeRepository> CheckCodeUseCase<V> {
    pub async fn execute(&self, identifier: &str, candidate: &str) -> Result<(), AuthServiceError> {
        consume_current(&self.codes, identifier, CodePurpose::Mfa, candidate).await?;
        Ok(())
    }
}
