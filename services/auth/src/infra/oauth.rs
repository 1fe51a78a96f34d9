//! Delegated OAuth collaborator: the thin code-for-profile HTTP exchange.

use serde::Deserialize;

use crate::domain::repository::OAuthProviderPort;
use crate::domain::types::OAuthProfile;
use crate::error::AuthServiceError;

#[derive(Debug, Clone, Default)]
pub struct OAuthClientConfig {
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
}

#[derive(Clone)]
pub struct HttpOAuthProvider {
    client: reqwest::Client,
    config: OAuthClientConfig,
}

impl HttpOAuthProvider {
    pub fn new(config: OAuthClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn credentials(&self, provider: &str) -> Result<(&str, &str), AuthServiceError> {
        let (id, secret) = match provider {
            "github" => (&self.config.github_client_id, &self.config.github_client_secret),
            "google" => (&self.config.google_client_id, &self.config.google_client_secret),
            _ => return Err(AuthServiceError::NotFound),
        };
        match (id, secret) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(AuthServiceError::Internal(anyhow::anyhow!(
                "oauth provider {provider} not configured"
            ))),
        }
    }

    async fn github(&self, code: &str, redirect_uri: &str) -> Result<OAuthProfile, AuthServiceError> {
        let (client_id, client_secret) = self.credentials("github")?;

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        #[derive(Deserialize)]
        struct GithubUser {
            id: u64,
            name: Option<String>,
            avatar_url: Option<String>,
            email: Option<String>,
        }

        let token: TokenResponse = self
            .client
            .post("https://github.com/login/oauth/access_token")
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "client_id": client_id,
                "client_secret": client_secret,
                "code": code,
                "redirect_uri": redirect_uri,
            }))
            .send()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?
            .json()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;

        let user: GithubUser = self
            .client
            .get("https://api.github.com/user")
            .header("User-Agent", "lattice-auth")
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?
            .json()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;

        Ok(OAuthProfile {
            provider: "github".to_owned(),
            subject: user.id.to_string(),
            email_verified: user.email.is_some(),
            email: user.email,
            display_name: user.name,
            avatar_url: user.avatar_url,
        })
    }

    async fn google(&self, code: &str, redirect_uri: &str) -> Result<OAuthProfile, AuthServiceError> {
        let (client_id, client_secret) = self.credentials("google")?;

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        #[derive(Deserialize)]
        struct GoogleUser {
            sub: String,
            email: Option<String>,
            #[serde(default)]
            email_verified: bool,
            name: Option<String>,
            picture: Option<String>,
        }

        let token: TokenResponse = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?
            .json()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;

        let user: GoogleUser = self
            .client
            .get("https://openidconnect.googleapis.com/v1/userinfo")
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?
            .json()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;

        Ok(OAuthProfile {
            provider: "google".to_owned(),
            subject: user.sub,
            email: user.email,
            email_verified: user.email_verified,
            display_name: user.name,
            avatar_url: user.picture,
        })
    }
}

impl OAuthProviderPort for HttpOAuthProvider {
    async fn fetch_profile(
        &self,
        provider: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OAuthProfile, AuthServiceError> {
        match provider {
            "github" => self.github(code, redirect_uri).await,
            "google" => self.google(code, redirect_uri).await,
            _ => Err(AuthServiceError::NotFound),
        }
    }
}
