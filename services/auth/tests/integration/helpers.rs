use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use uuid::Uuid;

use lattice_auth::domain::repository::{
    AuthMethodRepository, ChallengeRepository, Notifier, OAuthProviderPort,
    PersonalAccessTokenRepository, SessionRepository, UserRepository, VerificationCodeRepository,
};
use lattice_auth::domain::types::{
    AuthMethod, CodePurpose, MethodKind, OAuthProfile, OTP_MAX_ATTEMPTS, PersonalAccessToken,
    Session, SiweChallenge, User, VerificationCode,
};
use lattice_auth::error::AuthServiceError;
use lattice_auth::usecase::session::JwtSecrets;

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthServiceError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AuthServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), AuthServiceError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn record_login(
        &self,
        id: Uuid,
        kind: MethodKind,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            match kind {
                MethodKind::Email => user.email_verified = true,
                MethodKind::Sms => user.phone_verified = true,
                MethodKind::Wallet | MethodKind::Oauth => {}
            }
            user.last_login_at = Some(now);
            user.updated_at = now;
        }
        Ok(())
    }
}

// ── MockMethodRepo ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockMethodRepo {
    pub methods: Arc<Mutex<Vec<AuthMethod>>>,
}

impl MockMethodRepo {
    pub fn new(methods: Vec<AuthMethod>) -> Self {
        Self {
            methods: Arc::new(Mutex::new(methods)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<AuthMethod>>> {
        Arc::clone(&self.methods)
    }
}

impl AuthMethodRepository for MockMethodRepo {
    async fn find(
        &self,
        identifier: &str,
        kind: MethodKind,
    ) -> Result<Option<AuthMethod>, AuthServiceError> {
        Ok(self
            .methods
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.identifier == identifier && m.kind == kind)
            .cloned())
    }

    async fn create(&self, method: &AuthMethod) -> Result<(), AuthServiceError> {
        self.methods.lock().unwrap().push(method.clone());
        Ok(())
    }

    async fn touch_last_used(
        &self,
        id: Uuid,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        let mut methods = self.methods.lock().unwrap();
        if let Some(method) = methods.iter_mut().find(|m| m.id == id) {
            method.last_used_at = Some(now);
        }
        Ok(())
    }

    async fn clear_primary(&self, user_id: Uuid) -> Result<(), AuthServiceError> {
        for method in self
            .methods
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|m| m.user_id == user_id)
        {
            method.is_primary = false;
        }
        Ok(())
    }

    async fn set_primary(&self, id: Uuid) -> Result<(), AuthServiceError> {
        let mut methods = self.methods.lock().unwrap();
        if let Some(method) = methods.iter_mut().find(|m| m.id == id) {
            method.is_primary = true;
        }
        Ok(())
    }
}

// ── MockSessionRepo ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockSessionRepo {
    pub sessions: Arc<Mutex<Vec<Session>>>,
}

impl MockSessionRepo {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(sessions)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<Session>>> {
        Arc::clone(&self.sessions)
    }
}

impl SessionRepository for MockSessionRepo {
    async fn create(&self, session: &Session) -> Result<(), AuthServiceError> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, AuthServiceError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, AuthServiceError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.refresh_token == refresh_token)
            .cloned())
    }

    async fn revoke(
        &self,
        id: Uuid,
        now: chrono::DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.iter_mut().find(|s| s.id == id && !s.revoked) {
            Some(session) => {
                session.revoked = true;
                session.revoked_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_activity(
        &self,
        id: Uuid,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.iter_mut().find(|s| s.id == id) {
            session.last_activity_at = now;
        }
        Ok(())
    }
}

// ── MockCodeRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockCodeRepo {
    pub codes: Arc<Mutex<Vec<VerificationCode>>>,
}

impl MockCodeRepo {
    pub fn new(codes: Vec<VerificationCode>) -> Self {
        Self {
            codes: Arc::new(Mutex::new(codes)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<VerificationCode>>> {
        Arc::clone(&self.codes)
    }
}

impl VerificationCodeRepository for MockCodeRepo {
    async fn create(&self, code: &VerificationCode) -> Result<(), AuthServiceError> {
        self.codes.lock().unwrap().push(code.clone());
        Ok(())
    }

    async fn find_current(
        &self,
        identifier: &str,
        purpose: CodePurpose,
    ) -> Result<Option<VerificationCode>, AuthServiceError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.identifier == identifier && c.purpose == purpose && !c.verified)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<(), AuthServiceError> {
        let mut codes = self.codes.lock().unwrap();
        if let Some(code) = codes.iter_mut().find(|c| c.id == id) {
            code.attempts += 1;
        }
        Ok(())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let mut codes = self.codes.lock().unwrap();
        match codes.iter_mut().find(|c| c.id == id && !c.verified) {
            Some(code) => {
                code.verified = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ── MockChallengeRepo ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockChallengeRepo {
    pub challenges: Arc<Mutex<Vec<SiweChallenge>>>,
}

impl MockChallengeRepo {
    pub fn empty() -> Self {
        Self {
            challenges: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<SiweChallenge>>> {
        Arc::clone(&self.challenges)
    }
}

impl ChallengeRepository for MockChallengeRepo {
    async fn create(&self, challenge: &SiweChallenge) -> Result<(), AuthServiceError> {
        self.challenges.lock().unwrap().push(challenge.clone());
        Ok(())
    }

    async fn find_pending(
        &self,
        address: &str,
        nonce: &str,
    ) -> Result<Option<SiweChallenge>, AuthServiceError> {
        Ok(self
            .challenges
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.address == address && c.nonce == nonce && !c.verified)
            .cloned())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let mut challenges = self.challenges.lock().unwrap();
        match challenges.iter_mut().find(|c| c.id == id && !c.verified) {
            Some(challenge) => {
                challenge.verified = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ── MockPatRepo ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockPatRepo {
    pub tokens: Arc<Mutex<Vec<PersonalAccessToken>>>,
    /// While > 0, `exists` reports a collision and decrements.
    pub forced_collisions: Arc<Mutex<u32>>,
}

impl MockPatRepo {
    pub fn new(tokens: Vec<PersonalAccessToken>) -> Self {
        Self {
            tokens: Arc::new(Mutex::new(tokens)),
            forced_collisions: Arc::new(Mutex::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn with_collisions(count: u32) -> Self {
        let repo = Self::empty();
        *repo.forced_collisions.lock().unwrap() = count;
        repo
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<PersonalAccessToken>>> {
        Arc::clone(&self.tokens)
    }
}

impl PersonalAccessTokenRepository for MockPatRepo {
    async fn create(&self, token: &PersonalAccessToken) -> Result<(), AuthServiceError> {
        self.tokens.lock().unwrap().push(token.clone());
        Ok(())
    }

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<PersonalAccessToken>, AuthServiceError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<PersonalAccessToken>, AuthServiceError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn exists(&self, token: &str) -> Result<bool, AuthServiceError> {
        let mut forced = self.forced_collisions.lock().unwrap();
        if *forced > 0 {
            *forced -= 1;
            return Ok(true);
        }
        Ok(self.tokens.lock().unwrap().iter().any(|t| t.token == token))
    }

    async fn count_active(
        &self,
        user_id: Uuid,
        now: chrono::DateTime<Utc>,
    ) -> Result<u64, AuthServiceError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && t.expires_at.is_none_or(|e| e > now))
            .count() as u64)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PersonalAccessToken>, AuthServiceError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| t.id != id);
        Ok(tokens.len() < before)
    }

    async fn touch_last_used(
        &self,
        id: Uuid,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.id == id) {
            token.last_used_at = Some(now);
        }
        Ok(())
    }

    async fn delete_expired(
        &self,
        now: chrono::DateTime<Utc>,
    ) -> Result<u64, AuthServiceError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| t.expires_at.is_none_or(|e| e > now));
        Ok((before - tokens.len()) as u64)
    }
}

// ── MockNotifier / MockOAuthPort ─────────────────────────────────────────────

#[derive(Clone)]
pub struct MockNotifier {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            fail: true,
        }
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.sent)
    }
}

impl Notifier for MockNotifier {
    async fn send_verification_code(
        &self,
        destination: &str,
        code: &str,
    ) -> Result<(), AuthServiceError> {
        if self.fail {
            return Err(AuthServiceError::DeliveryFailed);
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_owned(), code.to_owned()));
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockOAuthPort {
    pub profile: OAuthProfile,
}

impl OAuthProviderPort for MockOAuthPort {
    async fn fetch_profile(
        &self,
        _provider: &str,
        _code: &str,
        _redirect_uri: &str,
    ) -> Result<OAuthProfile, AuthServiceError> {
        Ok(self.profile.clone())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn test_secrets() -> JwtSecrets {
    JwtSecrets {
        access: "test-access-secret-for-unit-tests".to_owned(),
        refresh: "test-refresh-secret-for-unit-tests".to_owned(),
    }
}

pub fn test_user() -> User {
    let now = Utc::now();
    User {
        id: Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap(),
        email: Some("user@example.com".to_owned()),
        phone: None,
        email_verified: true,
        phone_verified: false,
        display_name: None,
        avatar_url: None,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_code(identifier: &str, purpose: CodePurpose, code: &str) -> VerificationCode {
    let now = Utc::now();
    VerificationCode {
        id: Uuid::new_v4(),
        identifier: identifier.to_owned(),
        purpose,
        code: code.to_owned(),
        expires_at: now + Duration::seconds(600),
        attempts: 0,
        max_attempts: OTP_MAX_ATTEMPTS,
        verified: false,
        created_at: now,
    }
}

pub fn test_pat(user_id: Uuid, token: &str) -> PersonalAccessToken {
    let now = Utc::now();
    PersonalAccessToken {
        id: Uuid::new_v4(),
        user_id,
        name: "test token".to_owned(),
        token: token.to_owned(),
        expires_at: None,
        last_used_at: None,
        created_at: now,
    }
}
