//! Delegated OAuth login. The code exchange itself lives behind
//! [`OAuthProviderPort`]; this use case only consumes the resulting profile.

use crate::domain::repository::{
    AuthMethodRepository, OAuthProviderPort, SessionRepository, UserRepository,
};
use crate::error::AuthServiceError;
use crate::usecase::identity::{LoginChannel, resolve_login};
use crate::usecase::session::{JwtSecrets, TokenPairOutput, mint_session};

pub struct OAuthLoginInput {
    pub provider: String,
    pub code: String,
    pub redirect_uri: String,
}

pub struct OAuthLoginUseCase<P, U, M, S>
where
    P: OAuthProviderPort,
    U: UserRepository,
    M: AuthMethodRepository,
    S: SessionRepository,
{
    pub provider_port: P,
    pub users: U,
    pub methods: M,
    pub sessions: S,
    pub secrets: JwtSecrets,
}

impl<P, U, M, S> OAuthLoginUseCase<P, U, M, S>
where
    P: OAuthProviderPort,
    U: UserRepository,
    M: AuthMethodRepository,
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        input: OAuthLoginInput,
    ) -> Result<TokenPairOutput, AuthServiceError> {
        let profile = self
            .provider_port
            .fetch_profile(&input.provider, &input.code, &input.redirect_uri)
            .await?;

        let user = resolve_login(&self.users, &self.methods, &LoginChannel::Oauth(profile)).await?;
        mint_session(&self.sessions, &user, &self.secrets).await
    }
}
