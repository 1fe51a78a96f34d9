use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use lattice_auth_schema::{
    auth_methods, personal_access_tokens, sessions, siwe_challenges, users, verification_codes,
};

use crate::domain::repository::{
    AuthMethodRepository, ChallengeRepository, PersonalAccessTokenRepository, SessionRepository,
    UserRepository, VerificationCodeRepository,
};
use crate::domain::types::{
    AuthMethod, CodePurpose, MethodKind, PersonalAccessToken, Session, SiweChallenge, User,
    VerificationCode,
};
use crate::error::AuthServiceError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Phone.eq(phone))
            .one(&self.db)
            .await
            .context("find user by phone")?;
        Ok(model.map(user_from_model))
    }

    async fn create(&self, user: &User) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            phone: Set(user.phone.clone()),
            email_verified: Set(user.email_verified),
            phone_verified: Set(user.phone_verified),
            display_name: Set(user.display_name.clone()),
            avatar_url: Set(user.avatar_url.clone()),
            last_login_at: Set(user.last_login_at),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create user")?;
        Ok(())
    }

    async fn record_login(
        &self,
        id: Uuid,
        kind: MethodKind,
        now: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        let mut active = users::ActiveModel {
            id: Set(id),
            last_login_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        };
        match kind {
            MethodKind::Email => active.email_verified = Set(true),
            MethodKind::Sms => active.phone_verified = Set(true),
            MethodKind::Wallet | MethodKind::Oauth => {}
        }
        active.update(&self.db).await.context("record login")?;
        Ok(())
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        phone: model.phone,
        email_verified: model.email_verified,
        phone_verified: model.phone_verified,
        display_name: model.display_name,
        avatar_url: model.avatar_url,
        last_login_at: model.last_login_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── AuthMethod repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAuthMethodRepository {
    pub db: DatabaseConnection,
}

impl AuthMethodRepository for DbAuthMethodRepository {
    async fn find(
        &self,
        identifier: &str,
        kind: MethodKind,
    ) -> Result<Option<AuthMethod>, AuthServiceError> {
        let model = auth_methods::Entity::find()
            .filter(auth_methods::Column::Identifier.eq(identifier))
            .filter(auth_methods::Column::Kind.eq(kind.as_str()))
            .one(&self.db)
            .await
            .context("find auth method")?;
        model.map(method_from_model).transpose()
    }

    async fn create(&self, method: &AuthMethod) -> Result<(), AuthServiceError> {
        auth_methods::ActiveModel {
            id: Set(method.id),
            user_id: Set(method.user_id),
            kind: Set(method.kind.as_str().to_owned()),
            provider: Set(method.provider.clone()),
            identifier: Set(method.identifier.clone()),
            verified: Set(method.verified),
            is_primary: Set(method.is_primary),
            last_used_at: Set(method.last_used_at),
            created_at: Set(method.created_at),
        }
        .insert(&self.db)
        .await
        .context("create auth method")?;
        Ok(())
    }

    async fn touch_last_used(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        auth_methods::ActiveModel {
            id: Set(id),
            last_used_at: Set(Some(now)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("touch auth method last-used")?;
        Ok(())
    }

    async fn clear_primary(&self, user_id: Uuid) -> Result<(), AuthServiceError> {
        auth_methods::Entity::update_many()
            .col_expr(auth_methods::Column::IsPrimary, Expr::value(false))
            .filter(auth_methods::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("clear primary auth methods")?;
        Ok(())
    }

    async fn set_primary(&self, id: Uuid) -> Result<(), AuthServiceError> {
        auth_methods::ActiveModel {
            id: Set(id),
            is_primary: Set(true),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set primary auth method")?;
        Ok(())
    }
}

fn method_from_model(model: auth_methods::Model) -> Result<AuthMethod, AuthServiceError> {
    let kind = MethodKind::parse(&model.kind).ok_or_else(|| {
        AuthServiceError::Internal(anyhow::anyhow!("unknown auth method kind: {}", model.kind))
    })?;
    Ok(AuthMethod {
        id: model.id,
        user_id: model.user_id,
        kind,
        provider: model.provider,
        identifier: model.identifier,
        verified: model.verified,
        is_primary: model.is_primary,
        last_used_at: model.last_used_at,
        created_at: model.created_at,
    })
}

// ── Session repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSessionRepository {
    pub db: DatabaseConnection,
}

impl SessionRepository for DbSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), AuthServiceError> {
        sessions::ActiveModel {
            id: Set(session.id),
            user_id: Set(session.user_id),
            refresh_token: Set(session.refresh_token.clone()),
            expires_at: Set(session.expires_at),
            revoked: Set(session.revoked),
            revoked_at: Set(session.revoked_at),
            last_activity_at: Set(session.last_activity_at),
            created_at: Set(session.created_at),
        }
        .insert(&self.db)
        .await
        .context("create session")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, AuthServiceError> {
        let model = sessions::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find session by id")?;
        Ok(model.map(session_from_model))
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, AuthServiceError> {
        let model = sessions::Entity::find()
            .filter(sessions::Column::RefreshToken.eq(refresh_token))
            .one(&self.db)
            .await
            .context("find session by refresh token")?;
        Ok(model.map(session_from_model))
    }

    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, AuthServiceError> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::Revoked, Expr::value(true))
            .col_expr(sessions::Column::RevokedAt, Expr::value(Some(now)))
            .filter(sessions::Column::Id.eq(id))
            .filter(sessions::Column::Revoked.eq(false))
            .exec(&self.db)
            .await
            .context("revoke session")?;
        Ok(result.rows_affected > 0)
    }

    async fn touch_activity(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        sessions::ActiveModel {
            id: Set(id),
            last_activity_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("touch session activity")?;
        Ok(())
    }
}

fn session_from_model(model: sessions::Model) -> Session {
    Session {
        id: model.id,
        user_id: model.user_id,
        refresh_token: model.refresh_token,
        expires_at: model.expires_at,
        revoked: model.revoked,
        revoked_at: model.revoked_at,
        last_activity_at: model.last_activity_at,
        created_at: model.created_at,
    }
}

// ── VerificationCode repository ───────────────────────────────────────────────

#[derive(Clone)]
pub struct DbVerificationCodeRepository {
    pub db: DatabaseConnection,
}

impl VerificationCodeRepository for DbVerificationCodeRepository {
    async fn create(&self, code: &VerificationCode) -> Result<(), AuthServiceError> {
        verification_codes::ActiveModel {
            id: Set(code.id),
            identifier: Set(code.identifier.clone()),
            purpose: Set(code.purpose.as_str().to_owned()),
            code: Set(code.code.clone()),
            expires_at: Set(code.expires_at),
            attempts: Set(code.attempts),
            max_attempts: Set(code.max_attempts),
            verified: Set(code.verified),
            created_at: Set(code.created_at),
        }
        .insert(&self.db)
        .await
        .context("create verification code")?;
        Ok(())
    }

    async fn find_current(
        &self,
        identifier: &str,
        purpose: CodePurpose,
    ) -> Result<Option<VerificationCode>, AuthServiceError> {
        let model = verification_codes::Entity::find()
            .filter(verification_codes::Column::Identifier.eq(identifier))
            .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
            .filter(verification_codes::Column::Verified.eq(false))
            .order_by_desc(verification_codes::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find current verification code")?;
        model.map(code_from_model).transpose()
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<(), AuthServiceError> {
        verification_codes::Entity::update_many()
            .col_expr(
                verification_codes::Column::Attempts,
                Expr::col(verification_codes::Column::Attempts).add(1),
            )
            .filter(verification_codes::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("increment code attempts")?;
        Ok(())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        // Conditional update keeps check-then-set indivisible under
        // concurrent verifies for the same identifier.
        let result = verification_codes::Entity::update_many()
            .col_expr(verification_codes::Column::Verified, Expr::value(true))
            .filter(verification_codes::Column::Id.eq(id))
            .filter(verification_codes::Column::Verified.eq(false))
            .exec(&self.db)
            .await
            .context("consume verification code")?;
        Ok(result.rows_affected > 0)
    }
}

fn code_from_model(model: verification_codes::Model) -> Result<VerificationCode, AuthServiceError> {
    let purpose = CodePurpose::parse(&model.purpose).ok_or_else(|| {
        AuthServiceError::Internal(anyhow::anyhow!("unknown code purpose: {}", model.purpose))
    })?;
    Ok(VerificationCode {
        id: model.id,
        identifier: model.identifier,
        purpose,
        code: model.code,
        expires_at: model.expires_at,
        attempts: model.attempts,
        max_attempts: model.max_attempts,
        verified: model.verified,
        created_at: model.created_at,
    })
}

// ── Challenge repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbChallengeRepository {
    pub db: DatabaseConnection,
}

impl ChallengeRepository for DbChallengeRepository {
    async fn create(&self, challenge: &SiweChallenge) -> Result<(), AuthServiceError> {
        siwe_challenges::ActiveModel {
            id: Set(challenge.id),
            address: Set(challenge.address.clone()),
            nonce: Set(challenge.nonce.clone()),
            message: Set(challenge.message.clone()),
            expires_at: Set(challenge.expires_at),
            verified: Set(challenge.verified),
            created_at: Set(challenge.created_at),
        }
        .insert(&self.db)
        .await
        .context("create siwe challenge")?;
        Ok(())
    }

    async fn find_pending(
        &self,
        address: &str,
        nonce: &str,
    ) -> Result<Option<SiweChallenge>, AuthServiceError> {
        let model = siwe_challenges::Entity::find()
            .filter(siwe_challenges::Column::Address.eq(address))
            .filter(siwe_challenges::Column::Nonce.eq(nonce))
            .filter(siwe_challenges::Column::Verified.eq(false))
            .one(&self.db)
            .await
            .context("find pending siwe challenge")?;
        Ok(model.map(challenge_from_model))
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let result = siwe_challenges::Entity::update_many()
            .col_expr(siwe_challenges::Column::Verified, Expr::value(true))
            .filter(siwe_challenges::Column::Id.eq(id))
            .filter(siwe_challenges::Column::Verified.eq(false))
            .exec(&self.db)
            .await
            .context("consume siwe challenge")?;
        Ok(result.rows_affected > 0)
    }
}

fn challenge_from_model(model: siwe_challenges::Model) -> SiweChallenge {
    SiweChallenge {
        id: model.id,
        address: model.address,
        nonce: model.nonce,
        message: model.message,
        expires_at: model.expires_at,
        verified: model.verified,
        created_at: model.created_at,
    }
}

// ── PersonalAccessToken repository ────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPersonalAccessTokenRepository {
    pub db: DatabaseConnection,
}

impl PersonalAccessTokenRepository for DbPersonalAccessTokenRepository {
    async fn create(&self, token: &PersonalAccessToken) -> Result<(), AuthServiceError> {
        personal_access_tokens::ActiveModel {
            id: Set(token.id),
            user_id: Set(token.user_id),
            name: Set(token.name.clone()),
            token: Set(token.token.clone()),
            expires_at: Set(token.expires_at),
            last_used_at: Set(token.last_used_at),
            created_at: Set(token.created_at),
        }
        .insert(&self.db)
        .await
        .context("create personal access token")?;
        Ok(())
    }

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<PersonalAccessToken>, AuthServiceError> {
        let model = personal_access_tokens::Entity::find()
            .filter(personal_access_tokens::Column::Token.eq(token))
            .one(&self.db)
            .await
            .context("find token by string")?;
        Ok(model.map(pat_from_model))
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<PersonalAccessToken>, AuthServiceError> {
        let model = personal_access_tokens::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find token by id")?;
        Ok(model.map(pat_from_model))
    }

    async fn exists(&self, token: &str) -> Result<bool, AuthServiceError> {
        let count = personal_access_tokens::Entity::find()
            .filter(personal_access_tokens::Column::Token.eq(token))
            .count(&self.db)
            .await
            .context("check token existence")?;
        Ok(count > 0)
    }

    async fn count_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AuthServiceError> {
        let count = personal_access_tokens::Entity::find()
            .filter(personal_access_tokens::Column::UserId.eq(user_id))
            .filter(
                Condition::any()
                    .add(personal_access_tokens::Column::ExpiresAt.is_null())
                    .add(personal_access_tokens::Column::ExpiresAt.gt(now)),
            )
            .count(&self.db)
            .await
            .context("count active tokens")?;
        Ok(count)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PersonalAccessToken>, AuthServiceError> {
        let models = personal_access_tokens::Entity::find()
            .filter(personal_access_tokens::Column::UserId.eq(user_id))
            .order_by_desc(personal_access_tokens::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list tokens by user")?;
        Ok(models.into_iter().map(pat_from_model).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let result = personal_access_tokens::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete token")?;
        Ok(result.rows_affected > 0)
    }

    async fn touch_last_used(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        personal_access_tokens::Entity::update_many()
            .col_expr(
                personal_access_tokens::Column::LastUsedAt,
                Expr::value(Some(now)),
            )
            .filter(personal_access_tokens::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("touch token last-used")?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthServiceError> {
        let result = personal_access_tokens::Entity::delete_many()
            .filter(personal_access_tokens::Column::ExpiresAt.is_not_null())
            .filter(personal_access_tokens::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .context("delete expired tokens")?;
        Ok(result.rows_affected)
    }
}

fn pat_from_model(model: personal_access_tokens::Model) -> PersonalAccessToken {
    PersonalAccessToken {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        token: model.token,
        expires_at: model.expires_at,
        last_used_at: model.last_used_at,
        created_at: model.created_at,
    }
}
