//! HTTP notification collaborator for out-of-band code delivery.

use crate::domain::repository::Notifier;
use crate::error::AuthServiceError;

/// Posts `{destination, code}` to the configured delivery endpoint, which
/// fans out to email or SMS transport on the other side.
#[derive(Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl Notifier for HttpNotifier {
    async fn send_verification_code(
        &self,
        destination: &str,
        code: &str,
    ) -> Result<(), AuthServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({
                "destination": destination,
                "code": code,
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "notification dispatch failed");
                AuthServiceError::DeliveryFailed
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "notification endpoint rejected delivery");
            return Err(AuthServiceError::DeliveryFailed);
        }
        Ok(())
    }
}
