use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::infra::db::{
    DbAuthMethodRepository, DbChallengeRepository, DbPersonalAccessTokenRepository,
    DbSessionRepository, DbUserRepository, DbVerificationCodeRepository,
};
use crate::infra::notify::HttpNotifier;
use crate::infra::oauth::HttpOAuthProvider;
use crate::ratelimit::{InMemoryRateLimitStore, RateLimiter};
use crate::usecase::session::JwtSecrets;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub secrets: JwtSecrets,
    pub cookie_domain: String,
    pub siwe_domain: String,
    pub siwe_uri: String,
    pub token_prefix: String,
    pub token_environment: String,
    pub rate_limiter: Arc<RateLimiter<InMemoryRateLimitStore>>,
    pub notifier: HttpNotifier,
    pub oauth: HttpOAuthProvider,
    pub pat_last_used: UnboundedSender<Uuid>,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn method_repo(&self) -> DbAuthMethodRepository {
        DbAuthMethodRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_repo(&self) -> DbSessionRepository {
        DbSessionRepository {
            db: self.db.clone(),
        }
    }

    pub fn code_repo(&self) -> DbVerificationCodeRepository {
        DbVerificationCodeRepository {
            db: self.db.clone(),
        }
    }

    pub fn challenge_repo(&self) -> DbChallengeRepository {
        DbChallengeRepository {
            db: self.db.clone(),
        }
    }

    pub fn pat_repo(&self) -> DbPersonalAccessTokenRepository {
        DbPersonalAccessTokenRepository {
            db: self.db.clone(),
        }
    }
}
