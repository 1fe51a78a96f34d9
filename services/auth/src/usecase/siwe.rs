//! SIWE challenge issuance and verification.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::repository::{
    AuthMethodRepository, ChallengeRepository, SessionRepository, UserRepository,
};
use crate::domain::types::{CHALLENGE_TTL_SECS, SiweChallenge};
use crate::error::AuthServiceError;
use crate::siwe::message::{SiweMessage, build_message, parse_nonce};
use crate::siwe::recover::verify_message_signature;
use crate::usecase::identity::{LoginChannel, resolve_login};
use crate::usecase::otp::generate_nonce;
use crate::usecase::session::{JwtSecrets, TokenPairOutput, mint_session};

/// `0x` + 40 hex characters.
pub fn is_valid_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

// ── CreateChallenge ──────────────────────────────────────────────────────────

pub struct CreateChallengeInput {
    pub address: String,
    pub chain_id: u64,
    pub statement: Option<String>,
}

#[derive(Debug)]
pub struct ChallengeOutput {
    pub message: String,
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

pub struct CreateChallengeUseCase<C: ChallengeRepository> {
    pub challenges: C,
    /// Relying-party domain rendered into the greeting line.
    pub domain: String,
    /// Relying-party URI rendered into the `URI:` line.
    pub uri: String,
}

impl<C: ChallengeRepository> CreateChallengeUseCase<C> {
    pub async fn execute(
        &self,
        input: CreateChallengeInput,
    ) -> Result<ChallengeOutput, AuthServiceError> {
        if !is_valid_address(&input.address) {
            return Err(AuthServiceError::InvalidAddress);
        }

        let nonce = generate_nonce();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(CHALLENGE_TTL_SECS);

        let message = build_message(&SiweMessage {
            domain: self.domain.clone(),
            address: input.address.clone(),
            statement: input.statement,
            uri: self.uri.clone(),
            chain_id: input.chain_id,
            nonce: nonce.clone(),
            issued_at: now,
            expiration_time: Some(expires_at),
            not_before: None,
            request_id: None,
            resources: vec![],
        });

        let challenge = SiweChallenge {
            id: Uuid::new_v4(),
            address: input.address.to_lowercase(),
            nonce: nonce.clone(),
            message: message.clone(),
            expires_at,
            verified: false,
            created_at: now,
        };
        self.challenges.create(&challenge).await?;

        Ok(ChallengeOutput {
            message,
            nonce,
            expires_at,
        })
    }
}

// ── VerifyChallenge ──────────────────────────────────────────────────────────

pub struct VerifyChallengeInput {
    pub address: String,
    pub message: String,
    pub signature: String,
}

pub struct VerifyChallengeUseCase<C, U, M, S>
where
    C: ChallengeRepository,
    U: UserRepository,
    M: AuthMethodRepository,
    S: SessionRepository,
{
    pub challenges: C,
    pub users: U,
    pub methods: M,
    pub sessions: S,
    pub secrets: JwtSecrets,
}

impl<C, U, M, S> VerifyChallengeUseCase<C, U, M, S>
where
    C: ChallengeRepository,
    U: UserRepository,
    M: AuthMethodRepository,
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        input: VerifyChallengeInput,
    ) -> Result<TokenPairOutput, AuthServiceError> {
        if !is_valid_address(&input.address) {
            return Err(AuthServiceError::InvalidAddress);
        }
        let nonce = parse_nonce(&input.message).ok_or(AuthServiceError::MalformedMessage)?;
        let address = input.address.to_lowercase();

        let challenge = self
            .challenges
            .find_pending(&address, nonce)
            .await?
            .ok_or(AuthServiceError::NotFound)?;
        if challenge.is_expired(Utc::now()) {
            return Err(AuthServiceError::ChallengeExpired);
        }

        // The signature is checked against the stored message text, so the
        // signed bytes are exactly the bytes this service issued.
        if !verify_message_signature(&input.address, &challenge.message, &input.signature) {
            return Err(AuthServiceError::SignatureMismatch);
        }

        // One-time consumption; the loser of a concurrent race sees the
        // challenge as never having existed.
        if !self.challenges.consume(challenge.id).await? {
            return Err(AuthServiceError::NotFound);
        }

        let user = resolve_login(&self.users, &self.methods, &LoginChannel::Wallet(address)).await?;
        mint_session(&self.sessions, &user, &self.secrets).await
    }
}
