//! User and auth-method resolution shared by every login method.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::repository::{AuthMethodRepository, UserRepository};
use crate::domain::types::{AuthMethod, MethodKind, OAuthProfile, User};
use crate::error::AuthServiceError;

/// The verified channel a login arrived through.
#[derive(Debug, Clone)]
pub enum LoginChannel {
    Email(String),
    Phone(String),
    /// Lower-cased wallet address.
    Wallet(String),
    Oauth(OAuthProfile),
}

impl LoginChannel {
    pub fn kind(&self) -> MethodKind {
        match self {
            Self::Email(_) => MethodKind::Email,
            Self::Phone(_) => MethodKind::Sms,
            Self::Wallet(_) => MethodKind::Wallet,
            Self::Oauth(_) => MethodKind::Oauth,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::Email(email) => email,
            Self::Phone(phone) => phone,
            Self::Wallet(address) => address,
            Self::Oauth(profile) => &profile.subject,
        }
    }

    fn provider(&self) -> Option<String> {
        match self {
            Self::Oauth(profile) => Some(profile.provider.clone()),
            _ => None,
        }
    }
}

fn new_user_for(channel: &LoginChannel, now: DateTime<Utc>) -> User {
    let mut user = User {
        id: Uuid::new_v4(),
        email: None,
        phone: None,
        email_verified: false,
        phone_verified: false,
        display_name: None,
        avatar_url: None,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    };
    match channel {
        LoginChannel::Email(email) => {
            user.email = Some(email.clone());
        }
        LoginChannel::Phone(phone) => {
            user.phone = Some(phone.clone());
        }
        LoginChannel::Wallet(_) => {}
        LoginChannel::Oauth(profile) => {
            user.email = profile.email.clone();
            user.email_verified = profile.email.is_some() && profile.email_verified;
            user.display_name = profile.display_name.clone();
            user.avatar_url = profile.avatar_url.clone();
        }
    }
    user
}

fn apply_login(user: &mut User, kind: MethodKind, now: DateTime<Utc>) {
    match kind {
        MethodKind::Email => user.email_verified = true,
        MethodKind::Sms => user.phone_verified = true,
        MethodKind::Wallet | MethodKind::Oauth => {}
    }
    user.last_login_at = Some(now);
    user.updated_at = now;
}

/// Find or create the user behind a successful proof of identity.
///
/// Resolution order: existing auth method by (identifier, kind) → existing
/// user by contact point → fresh user. The auth method is created verified
/// on first use; a fresh user's first method becomes primary via
/// clear-all-then-set-one. Verification flags and last-login are stamped
/// on every successful login.
pub async fn resolve_login<U, M>(
    users: &U,
    methods: &M,
    channel: &LoginChannel,
) -> Result<User, AuthServiceError>
where
    U: UserRepository,
    M: AuthMethodRepository,
{
    let now = Utc::now();
    let kind = channel.kind();
    let identifier = channel.identifier().to_owned();

    let mut user = if let Some(method) = methods.find(&identifier, kind).await? {
        methods.touch_last_used(method.id, now).await?;
        users
            .find_by_id(method.user_id)
            .await?
            .ok_or(AuthServiceError::NotFound)?
    } else {
        let existing = match channel {
            LoginChannel::Email(email) => users.find_by_email(email).await?,
            LoginChannel::Phone(phone) => users.find_by_phone(phone).await?,
            LoginChannel::Wallet(_) => None,
            LoginChannel::Oauth(profile) => match &profile.email {
                Some(email) => users.find_by_email(email).await?,
                None => None,
            },
        };
        let (user, created) = match existing {
            Some(user) => (user, false),
            None => {
                let user = new_user_for(channel, now);
                users.create(&user).await?;
                (user, true)
            }
        };

        let method = AuthMethod {
            id: Uuid::new_v4(),
            user_id: user.id,
            kind,
            provider: channel.provider(),
            identifier,
            verified: true,
            is_primary: false,
            last_used_at: Some(now),
            created_at: now,
        };
        methods.create(&method).await?;
        if created {
            methods.clear_primary(user.id).await?;
            methods.set_primary(method.id).await?;
        }
        user
    };

    users.record_login(user.id, kind, now).await?;
    apply_login(&mut user, kind, now);
    Ok(user)
}

/// Explicitly make one of a user's methods primary: unset all, set one.
pub struct SetPrimaryMethodUseCase<M: AuthMethodRepository> {
    pub methods: M,
}

impl<M: AuthMethodRepository> SetPrimaryMethodUseCase<M> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        identifier: &str,
        kind: MethodKind,
    ) -> Result<(), AuthServiceError> {
        let method = self
            .methods
            .find(identifier, kind)
            .await?
            .ok_or(AuthServiceError::NotFound)?;
        if method.user_id != user_id {
            return Err(AuthServiceError::Forbidden);
        }
        self.methods.clear_primary(user_id).await?;
        self.methods.set_primary(method.id).await?;
        Ok(())
    }
}
